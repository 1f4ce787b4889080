use std::str::FromStr;

use crate::error::TransformError;

/// A border policy for neighborhood lookups that fall outside the image.
///
/// Every sliding-window operation of the engine resolves out-of-bounds
/// neighbors through one of these strategies, so the whole catalog shares a
/// single border behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingStrategy {
    /// Out-of-bounds neighbors read as zero.
    ///
    /// Example: ...d c b a | 0 0 0 0...
    Zero,

    /// The outermost row or column repeats into the padded region.
    ///
    /// Example: ...d c b a | a a a a...
    Replicate,

    /// Pixel values reflect at the boundary, starting with the edge pixel.
    ///
    /// Example: ...d c b a | a b c d...
    Reflect,

    /// Content wraps around from the opposite side.
    ///
    /// Example: ...d c b a | w x y z...
    Wrap,
}

impl PaddingStrategy {
    #[inline]
    fn reflect(i: isize, len: usize) -> usize {
        if len == 1 {
            return 0;
        }
        let len = len as isize;
        let mut i = i;
        while i < 0 || i >= len {
            if i < 0 {
                i = -i - 1;
            } else {
                i = 2 * len - i - 1;
            }
        }
        i as usize
    }

    #[inline]
    fn wrap(i: isize, len: usize) -> usize {
        ((i % len as isize + len as isize) % len as isize) as usize
    }

    /// Maps index `i` to a valid index within `[0, len)`, or `None` for a
    /// zero-filled neighbor.
    ///
    /// # Examples
    ///
    /// ```
    /// use vislab_imgproc::padding::PaddingStrategy;
    ///
    /// assert_eq!(PaddingStrategy::Replicate.map_index(-2, 5), Some(0));
    /// assert_eq!(PaddingStrategy::Zero.map_index(-2, 5), None);
    /// assert_eq!(PaddingStrategy::Wrap.map_index(5, 5), Some(0));
    /// ```
    #[inline]
    pub fn map_index(&self, i: isize, len: usize) -> Option<usize> {
        if i >= 0 && (i as usize) < len {
            return Some(i as usize);
        }
        match self {
            PaddingStrategy::Zero => None,
            PaddingStrategy::Replicate => Some(i.clamp(0, len as isize - 1) as usize),
            PaddingStrategy::Reflect => Some(Self::reflect(i, len)),
            PaddingStrategy::Wrap => Some(Self::wrap(i, len)),
        }
    }
}

impl FromStr for PaddingStrategy {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zero" => Ok(PaddingStrategy::Zero),
            "replicate" => Ok(PaddingStrategy::Replicate),
            "reflect" => Ok(PaddingStrategy::Reflect),
            "wrap" => Ok(PaddingStrategy::Wrap),
            _ => Err(TransformError::UnknownPadding(s.to_string())),
        }
    }
}

impl std::fmt::Display for PaddingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            PaddingStrategy::Zero => "zero",
            PaddingStrategy::Replicate => "replicate",
            PaddingStrategy::Reflect => "reflect",
            PaddingStrategy::Wrap => "wrap",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replicate_clamps_both_sides() {
        assert_eq!(PaddingStrategy::Replicate.map_index(-3, 4), Some(0));
        assert_eq!(PaddingStrategy::Replicate.map_index(9, 4), Some(3));
    }

    #[test]
    fn reflect_mirrors_including_edge() {
        // ...d c b a | a b c d...
        assert_eq!(PaddingStrategy::Reflect.map_index(-1, 4), Some(0));
        assert_eq!(PaddingStrategy::Reflect.map_index(-2, 4), Some(1));
        assert_eq!(PaddingStrategy::Reflect.map_index(4, 4), Some(3));
        assert_eq!(PaddingStrategy::Reflect.map_index(5, 4), Some(2));
    }

    #[test]
    fn wrap_is_circular() {
        assert_eq!(PaddingStrategy::Wrap.map_index(-1, 4), Some(3));
        assert_eq!(PaddingStrategy::Wrap.map_index(6, 4), Some(2));
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(matches!(
            "mirror".parse::<PaddingStrategy>(),
            Err(TransformError::UnknownPadding(_))
        ));
    }

    #[test]
    fn in_range_indices_pass_through() {
        for strategy in [
            PaddingStrategy::Zero,
            PaddingStrategy::Replicate,
            PaddingStrategy::Reflect,
            PaddingStrategy::Wrap,
        ] {
            assert_eq!(strategy.map_index(2, 4), Some(2));
        }
    }
}

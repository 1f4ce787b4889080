//! The kernel catalog: named constant kernels, compass directions and
//! generated kernels.

use std::str::FromStr;

use crate::error::TransformError;

/// A dense 2-D convolution kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Kernel {
    /// Create a kernel from row-major data.
    ///
    /// # Errors
    ///
    /// Fails when the data length does not match `rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self, TransformError> {
        if data.len() != rows * cols {
            return Err(TransformError::InvalidKernelShape(data.len(), rows, cols));
        }
        Ok(Self { rows, cols, data })
    }

    fn from_matrix<const N: usize>(m: [[f32; N]; N]) -> Self {
        Self {
            rows: N,
            cols: N,
            data: m.into_iter().flatten().collect(),
        }
    }

    /// Number of kernel rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of kernel columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Kernel value at `(row, col)`.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    /// Kernel values as a row-major slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Coordinates of one concentric ring, clockwise from the top-left cell.
    fn ring_coords(n: usize, ring: usize) -> Vec<(usize, usize)> {
        let last = n - 1 - ring;
        if ring == last {
            return vec![(ring, ring)];
        }
        let mut coords = Vec::with_capacity(4 * (last - ring));
        for c in ring..=last {
            coords.push((ring, c));
        }
        for r in ring + 1..last {
            coords.push((r, last));
        }
        for c in (ring + 1..=last).rev() {
            coords.push((last, c));
        }
        for r in (ring + 1..=last).rev() {
            coords.push((r, ring));
        }
        coords
    }

    /// Rotate a square kernel clockwise by 45 degrees, rolling every
    /// concentric ring one cell forward.
    ///
    /// Eight successive rotations return the original kernel.
    pub fn rotate45_cw(&self) -> Kernel {
        assert_eq!(self.rows, self.cols, "45 degree rotation needs a square kernel");
        let n = self.rows;
        let mut out = self.clone();
        for ring in 0..n.div_ceil(2) {
            let coords = Self::ring_coords(n, ring);
            let len = coords.len();
            for (i, &(r, c)) in coords.iter().enumerate() {
                let (tr, tc) = coords[(i + 1) % len];
                out.data[tr * n + tc] = self.data[r * n + c];
            }
        }
        out
    }

    /// Rotate a square kernel clockwise by 90 degrees.
    pub fn rotate90_cw(&self) -> Kernel {
        assert_eq!(self.rows, self.cols, "90 degree rotation needs a square kernel");
        let n = self.rows;
        let mut data = vec![0.0; n * n];
        for (r, row) in data.chunks_exact_mut(n).enumerate() {
            for (c, out) in row.iter_mut().enumerate() {
                *out = self.data[(n - 1 - c) * n + r];
            }
        }
        Kernel {
            rows: n,
            cols: n,
            data,
        }
    }

    /// The 3x3 Prewitt x-derivative kernel.
    pub fn prewitt() -> Kernel {
        Self::from_matrix([[-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0]])
    }

    /// The 3x3 Sobel x-derivative kernel.
    pub fn sobel() -> Kernel {
        Self::from_matrix([[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]])
    }

    /// The 3x3 Laplacian kernel.
    pub fn laplace() -> Kernel {
        Self::from_matrix([[0.0, -1.0, 0.0], [-1.0, 4.0, -1.0], [0.0, -1.0, 0.0]])
    }

    /// The circular 7x7 SUSAN mask, ones marking the 37 mask positions.
    pub fn susan_mask() -> Kernel {
        Self::from_matrix([
            [0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0],
            [0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0],
            [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0],
            [0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0],
        ])
    }

    /// An n-by-n sharpening kernel: the center is `(n^2 - 1) / n`, every
    /// other cell `-1 / n`.
    ///
    /// # Errors
    ///
    /// Fails when `n` is even or zero.
    pub fn high_pass(n: usize) -> Result<Kernel, TransformError> {
        if n == 0 || n % 2 == 0 {
            return Err(TransformError::InvalidKernelSize(n));
        }
        let mut data = vec![-1.0 / n as f32; n * n];
        data[(n / 2) * n + n / 2] = (n * n - 1) as f32 / n as f32;
        Ok(Kernel {
            rows: n,
            cols: n,
            data,
        })
    }

    /// A normalized 2-D Gaussian kernel of side `2 * ceil(sigma) + 1`.
    pub fn gaussian(sigma: f32) -> Kernel {
        let radius = sigma.ceil().max(1.0) as usize;
        let n = 2 * radius + 1;
        let sigma_sq = sigma * sigma;
        let mut data = Vec::with_capacity(n * n);
        for r in 0..n {
            for c in 0..n {
                let y = r as f32 - radius as f32;
                let x = c as f32 - radius as f32;
                data.push((-(x * x + y * y) / (2.0 * sigma_sq)).exp());
            }
        }
        let norm: f32 = data.iter().sum();
        data.iter_mut().for_each(|v| *v /= norm);
        Kernel {
            rows: n,
            cols: n,
            data,
        }
    }

    /// The analytic Laplacian-of-Gaussian kernel, sized `floor(10 * sigma + 1)`
    /// square.
    pub fn laplacian_of_gaussian(sigma: f32) -> Kernel {
        let n = (sigma * 10.0 + 1.0) as usize;
        let half = (n / 2) as f32;
        let k = (2.0 * std::f32::consts::PI).sqrt() * sigma.powi(3);
        let mut data = Vec::with_capacity(n * n);
        for r in 0..n {
            for c in 0..n {
                let y = r as f32 - half;
                let x = c as f32 - half;
                let sum_sq_over_sigma = (x * x + y * y) / (sigma * sigma);
                data.push(-((2.0 - sum_sq_over_sigma) / k) * (-sum_sq_over_sigma / 2.0).exp());
            }
        }
        Kernel {
            rows: n,
            cols: n,
            data,
        }
    }
}

/// A compass direction for the directional border detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// 90 degrees; the base orientation of the catalog kernels.
    Vertical,
    /// 45 degrees.
    PositiveDiagonal,
    /// 0 degrees.
    Horizontal,
    /// 135 degrees.
    NegativeDiagonal,
}

impl Direction {
    /// The fixed 3x3 mask selecting the two neighbors along this direction.
    pub fn kernel(&self) -> Kernel {
        match self {
            Direction::Vertical => {
                Kernel::from_matrix([[0.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 0.0]])
            }
            Direction::PositiveDiagonal => {
                Kernel::from_matrix([[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]])
            }
            Direction::Horizontal => {
                Kernel::from_matrix([[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [0.0, 0.0, 0.0]])
            }
            Direction::NegativeDiagonal => {
                Kernel::from_matrix([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
            }
        }
    }

    /// Number of 45 degree steps away from the vertical base orientation.
    fn steps(&self) -> usize {
        match self {
            Direction::Vertical => 0,
            Direction::PositiveDiagonal => 1,
            Direction::Horizontal => 2,
            Direction::NegativeDiagonal => 3,
        }
    }

    /// Rotate a vertically aligned kernel to this direction.
    pub fn align(&self, vertical_kernel: &Kernel) -> Kernel {
        let mut kernel = vertical_kernel.clone();
        for _ in 0..self.steps() {
            kernel = kernel.rotate45_cw();
        }
        kernel
    }

    /// The direction matching a quantized gradient angle.
    ///
    /// # Errors
    ///
    /// Only 0, 45, 90 and 135 degrees name directions.
    pub fn from_angle(angle: i32) -> Result<Self, TransformError> {
        match angle {
            0 => Ok(Direction::Horizontal),
            45 => Ok(Direction::PositiveDiagonal),
            90 => Ok(Direction::Vertical),
            135 => Ok(Direction::NegativeDiagonal),
            other => Err(TransformError::UnsupportedAngle(other)),
        }
    }
}

impl FromStr for Direction {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vertical" => Ok(Direction::Vertical),
            "positive_diagonal" => Ok(Direction::PositiveDiagonal),
            "horizontal" => Ok(Direction::Horizontal),
            "negative_diagonal" => Ok(Direction::NegativeDiagonal),
            _ => Err(TransformError::UnknownDirection(s.to_string())),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Direction::Vertical => "vertical",
            Direction::PositiveDiagonal => "positive_diagonal",
            Direction::Horizontal => "horizontal",
            Direction::NegativeDiagonal => "negative_diagonal",
        };
        write!(f, "{name}")
    }
}

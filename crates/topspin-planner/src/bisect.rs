/// A search interval for a monotonic bisection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lo: f64,
    pub hi: f64,
}

impl Bracket {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn mid(&self) -> f64 {
        (self.lo + self.hi) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    /// The answer lies above `value`.
    pub fn raise(&mut self, value: f64) {
        self.lo = value;
    }

    /// The answer lies below `value`.
    pub fn lower(&mut self, value: f64) {
        self.hi = value;
    }
}

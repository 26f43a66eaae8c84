/// Describes a number's associated constants: minimum and maximum; zero, one,
/// and ten.
pub trait NumberConst {
    const MAX: Self;
    const MIN: Self;
    const ONE: Self;
    const TEN: Self;
    const ZERO: Self;
}

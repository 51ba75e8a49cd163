/// A point on a curve, in the (quantity, price) plane used for plotting
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// The horizontal (quantity) coordinate
    pub quantity: f64,
    /// The vertical (price) coordinate
    pub price: f64,
}

/// Input a UI event layer forwards to a ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RingInput {
    /// Wheel or drag; only the sign is used.
    Scroll(f64),
    /// Click or tap on the item with this index.
    Activate(usize),
}

/// Colors for the Okasaki-style red-black tree, including the two
/// transient colors (`BlackBlack`, `NegativeBlack`) Matt Might's deletion
/// scheme needs while bubbling a double-black node up toward the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
    BlackBlack,
    NegativeBlack,
}

impl Color {
    #[inline]
    pub fn blacken(&mut self) {
        match *self {
            Color::Red => *self = Color::Black,
            Color::Black => *self = Color::BlackBlack,
            Color::BlackBlack => unreachable!("double black cannot blacken further"),
            Color::NegativeBlack => *self = Color::Red,
        }
    }

    #[inline]
    pub fn redden(&mut self) {
        match *self {
            Color::Red => *self = Color::NegativeBlack,
            Color::Black => *self = Color::Red,
            Color::BlackBlack => *self = Color::Black,
            Color::NegativeBlack => unreachable!("negative black cannot redden further"),
        }
    }
}

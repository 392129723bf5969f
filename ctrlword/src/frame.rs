use crate::ControlWord;

/// Bytes in a control word.
pub const WORD_BYTES: usize = 4;

/// Transfer width of the DDS command framing.
pub const DDS_FRAME_LEN: usize = 5;

/// A wire frame in the DDS command framing.
pub type DdsFrame = WireFrame<DDS_FRAME_LEN>;

/// A control word serialized for transmission.
///
/// The word is stored most significant byte first in the last
/// [WORD_BYTES] bytes. Leading bytes pad the frame to the transfer width `L`
/// and are zero, so reading the frame as one big-endian integer yields the
/// word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WireFrame<const L: usize>([u8; L]);

impl<const L: usize> WireFrame<L> {
    const FITS_WORD: () =
        assert!(L >= WORD_BYTES, "Frame narrower than a control word");

    /// Serialize a raw 32 bit word.
    pub fn from_word(word: u32) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::FITS_WORD;
        let mut bytes = [0; L];
        bytes[L - WORD_BYTES..].copy_from_slice(&word.to_be_bytes());
        Self(bytes)
    }

    /// Wrap raw bytes, e.g. a bus test pattern.
    pub const fn from_bytes(bytes: [u8; L]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; L] {
        &self.0
    }

    /// Recover the word.
    ///
    /// Returns `None` if the padding is not zero, i.e. the frame does not
    /// carry a control word.
    pub fn word(&self) -> Option<u32> {
        #[allow(clippy::let_unit_value)]
        let () = Self::FITS_WORD;
        let (pad, word) = self.0.split_at(L - WORD_BYTES);
        if pad.iter().any(|&b| b != 0) {
            return None;
        }
        let mut be = [0; WORD_BYTES];
        be.copy_from_slice(word);
        Some(u32::from_be_bytes(be))
    }
}

impl<const L: usize> AsRef<[u8]> for WireFrame<L> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const L: usize> From<ControlWord> for WireFrame<L> {
    fn from(word: ControlWord) -> Self {
        Self::from_word(word.raw_value())
    }
}

/// Serialize a control word into an `L` byte frame, MSB first.
pub fn to_wire_frame<const L: usize>(word: ControlWord) -> WireFrame<L> {
    word.into()
}

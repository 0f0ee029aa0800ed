//! The set of transfer syntaxes understood by this library.
//!
//! The set is closed, so a plain enum replaces a run-time registry.
//! Each syntax carries the three properties which drive the rest of
//! the decoding pipeline: VR explicitness, byte order, and whether
//! pixel data comes encapsulated in an item sequence.
use byteordered::Endianness;
use std::fmt;

/// A transfer syntax recognized by this library.
///
/// Conversion from a UID string trims trailing spaces and NUL padding
/// first, since UI values are even-padded in the wire format.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum TransferSyntax {
    ImplicitVRLittleEndian,
    ExplicitVRLittleEndian,
    ExplicitVRBigEndian,
    JPEGBaseline,
    JPEGLossless,
    JPEG2000Lossless,
    JPEG2000,
    RLELossless,
}

impl TransferSyntax {
    /// Look up a transfer syntax by its UID,
    /// ignoring trailing spaces and NUL padding.
    pub fn from_uid(uid: &str) -> Option<Self> {
        use TransferSyntax::*;
        match uid.trim_end_matches(|c| c == ' ' || c == '\0') {
            "1.2.840.10008.1.2" => Some(ImplicitVRLittleEndian),
            "1.2.840.10008.1.2.1" => Some(ExplicitVRLittleEndian),
            "1.2.840.10008.1.2.2" => Some(ExplicitVRBigEndian),
            "1.2.840.10008.1.2.4.50" => Some(JPEGBaseline),
            "1.2.840.10008.1.2.4.70" => Some(JPEGLossless),
            "1.2.840.10008.1.2.4.90" => Some(JPEG2000Lossless),
            "1.2.840.10008.1.2.4.91" => Some(JPEG2000),
            "1.2.840.10008.1.2.5" => Some(RLELossless),
            _ => None,
        }
    }

    /// Retrieve this transfer syntax' UID.
    pub fn uid(self) -> &'static str {
        use TransferSyntax::*;
        match self {
            ImplicitVRLittleEndian => "1.2.840.10008.1.2",
            ExplicitVRLittleEndian => "1.2.840.10008.1.2.1",
            ExplicitVRBigEndian => "1.2.840.10008.1.2.2",
            JPEGBaseline => "1.2.840.10008.1.2.4.50",
            JPEGLossless => "1.2.840.10008.1.2.4.70",
            JPEG2000Lossless => "1.2.840.10008.1.2.4.90",
            JPEG2000 => "1.2.840.10008.1.2.4.91",
            RLELossless => "1.2.840.10008.1.2.5",
        }
    }

    /// The syntax' full name as given in PS3.6.
    pub fn name(self) -> &'static str {
        use TransferSyntax::*;
        match self {
            ImplicitVRLittleEndian => "Implicit VR Little Endian",
            ExplicitVRLittleEndian => "Explicit VR Little Endian",
            ExplicitVRBigEndian => "Explicit VR Big Endian",
            JPEGBaseline => "JPEG Baseline (Process 1)",
            JPEGLossless => "JPEG Lossless, Non-Hierarchical, First-Order Prediction",
            JPEG2000Lossless => "JPEG 2000 Image Compression (Lossless Only)",
            JPEG2000 => "JPEG 2000 Image Compression",
            RLELossless => "RLE Lossless",
        }
    }

    /// Whether data sets under this syntax carry explicit VR codes
    /// in their element headers.
    pub fn is_explicit_vr(self) -> bool {
        !matches!(self, TransferSyntax::ImplicitVRLittleEndian)
    }

    /// The byte order of the main data set under this syntax.
    pub fn endianness(self) -> Endianness {
        match self {
            TransferSyntax::ExplicitVRBigEndian => Endianness::Big,
            _ => Endianness::Little,
        }
    }

    /// Whether pixel data under this syntax is delivered as an
    /// encapsulated item sequence of compressed frames.
    pub fn is_encapsulated(self) -> bool {
        use TransferSyntax::*;
        matches!(
            self,
            JPEGBaseline | JPEGLossless | JPEG2000Lossless | JPEG2000 | RLELossless
        )
    }
}

impl fmt::Display for TransferSyntax {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TransferSyntax; 8] = [
        TransferSyntax::ImplicitVRLittleEndian,
        TransferSyntax::ExplicitVRLittleEndian,
        TransferSyntax::ExplicitVRBigEndian,
        TransferSyntax::JPEGBaseline,
        TransferSyntax::JPEGLossless,
        TransferSyntax::JPEG2000Lossless,
        TransferSyntax::JPEG2000,
        TransferSyntax::RLELossless,
    ];

    #[test]
    fn uid_round_trip() {
        for ts in ALL.iter() {
            assert_eq!(TransferSyntax::from_uid(ts.uid()), Some(*ts));
        }
    }

    #[test]
    fn uid_padding_is_trimmed() {
        assert_eq!(
            TransferSyntax::from_uid("1.2.840.10008.1.2.1\0"),
            Some(TransferSyntax::ExplicitVRLittleEndian),
        );
        assert_eq!(
            TransferSyntax::from_uid("1.2.840.10008.1.2.4.70 "),
            Some(TransferSyntax::JPEGLossless),
        );
        assert_eq!(TransferSyntax::from_uid("1.1.1.1"), None);
    }

    #[test]
    fn derived_properties() {
        use byteordered::Endianness;

        assert!(!TransferSyntax::ImplicitVRLittleEndian.is_explicit_vr());
        assert!(TransferSyntax::ExplicitVRLittleEndian.is_explicit_vr());
        assert_eq!(
            TransferSyntax::ExplicitVRBigEndian.endianness(),
            Endianness::Big
        );
        assert_eq!(
            TransferSyntax::JPEGLossless.endianness(),
            Endianness::Little
        );
        for ts in ALL.iter() {
            let encapsulated = !matches!(
                ts,
                TransferSyntax::ImplicitVRLittleEndian
                    | TransferSyntax::ExplicitVRLittleEndian
                    | TransferSyntax::ExplicitVRBigEndian
            );
            assert_eq!(ts.is_encapsulated(), encapsulated);
        }
    }
}

/// Rectangle encodings this client can negotiate.
///
/// The numeric values are the RFB wire identifiers. Zlib (6) is the
/// RealVNC-era registered encoding carrying a deflate stream of raw
/// pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Encoding {
    Raw = 0,
    CopyRect = 1,
    Rre = 2,
    CoRre = 4,
    Hextile = 5,
    Zlib = 6,
}

impl Encoding {
    /// Short name, as used by the `-d` command-line switch.
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Raw => "Raw",
            Encoding::CopyRect => "CopyRect",
            Encoding::Rre => "RRE",
            Encoding::CoRre => "CoRRE",
            Encoding::Hextile => "Hextile",
            Encoding::Zlib => "Zlib",
        }
    }

    /// Human-readable description for diagnostics.
    pub fn description(self) -> &'static str {
        match self {
            Encoding::Raw => "raw pixel data without compression",
            Encoding::CopyRect => "fast copy within framebuffer",
            Encoding::Rre => "rise and run length encoded pixel data (RRE)",
            Encoding::CoRre => "compact rise and run length encoded pixel data (CoRRE)",
            Encoding::Hextile => "16x16 tile encoded pixel data (hextile)",
            Encoding::Zlib => "zlib-compressed raw pixel data",
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Encoding::Raw),
            1 => Some(Encoding::CopyRect),
            2 => Some(Encoding::Rre),
            4 => Some(Encoding::CoRre),
            5 => Some(Encoding::Hextile),
            6 => Some(Encoding::Zlib),
            _ => None,
        }
    }
}

impl From<Encoding> for u32 {
    fn from(e: Encoding) -> Self {
        e as u32
    }
}

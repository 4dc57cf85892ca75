//! The table of provider format codes the pipeline knows how to name.

/// The container, resolution and rank of a provider format code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatEntry {
    pub itag: u32,
    pub container: &'static str,
    pub resolution: &'static str,
    /// Lower is better.
    pub preference: u32,
}

const fn entry(
    itag: u32,
    container: &'static str,
    resolution: &'static str,
    preference: u32,
) -> FormatEntry {
    FormatEntry {
        itag,
        container,
        resolution,
        preference,
    }
}

/// Every format code the pipeline accepts. Codes missing here are ignored.
pub const FORMATS: &[FormatEntry] = &[
    entry(13, "3gp", "240p", 10),
    entry(17, "3gp", "240p", 9),
    entry(36, "3gp", "320p", 8),
    entry(5, "flv", "240p", 7),
    entry(6, "flv", "240p", 6),
    entry(34, "flv", "320p", 5),
    entry(35, "flv", "480p", 4),
    entry(18, "mp4", "480p", 3),
    entry(22, "mp4", "720p", 2),
    entry(37, "mp4", "1080p", 1),
];

/// Looks up a format code.
pub fn lookup(itag: u32) -> Option<&'static FormatEntry> {
    FORMATS.iter().find(|format| format.itag == itag)
}

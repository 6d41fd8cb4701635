/// Download progress events emitted while streaming an artifact to disk.
#[derive(Debug, Clone, Copy)]
pub enum Progress {
    Starting { total: u64 },
    Chunk { current: u64, total: u64 },
    Complete { total: u64 },
}

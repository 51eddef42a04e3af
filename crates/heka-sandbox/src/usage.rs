/// What resource `usage()` reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageKind {
    Memory,
    Instructions,
}

/// Which statistic of that resource is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageStat {
    Current,
    Maximum,
    Limit,
}

// -
// Election namespace conventions

/// Node-name prefix for candidacy tokens created under the election
/// namespace. The registrar appends the session marker and the
/// coordination service appends the sequence suffix.
pub(crate) const CANDIDATE_PREFIX: &str = "c_";

/// Fixed width of service-assigned sequence suffixes. Suffixes are
/// zero-padded to this width so that the assigned names are unique;
/// ordering is still done numerically, never on the raw string.
pub(crate) const SEQUENCE_SUFFIX_WIDTH: usize = 10;

/// Default logical path under which all candidacy tokens of one election
/// group live.
pub(crate) const DEFAULT_ELECTION_NAMESPACE: &str = "/election";

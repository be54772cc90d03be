// Squad selection core: candidate table, value projection, exact roster
// optimization and the random baseline it is compared against.

pub mod category;
pub mod compare;
pub mod error;
pub mod forest;
pub mod optimizer;
pub mod quota;
pub mod roster;
pub mod sampler;
pub mod scorer;
pub mod table;

pub use category::Category;
pub use compare::{compare, Comparison};
pub use error::{Infeasibility, MalformedCandidate, MalformedReason, SelectionError};
pub use optimizer::optimize;
pub use quota::Quotas;
pub use roster::{fits_budget, Lineup, Roster};
pub use sampler::{sample_random, SamplerConfig};
pub use scorer::{score, ScoredCandidate, ScoredPool, ScorerConfig};
pub use table::{CandidateRecord, CandidateTable, RawCandidate};

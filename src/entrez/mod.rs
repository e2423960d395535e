// NCBI E-utilities access: the efetch client, MEDLINE parsing and request pacing.

pub mod client;
pub mod medline;
pub mod rate_limiter;
pub mod traits;

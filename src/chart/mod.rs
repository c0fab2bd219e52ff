/// Chart layer: from UI selections to a renderer-agnostic chart spec.
///
/// ```text
///   ChartRequest ──► selector ──► ChartOutcome { chart: Option<ChartSpec>, warning }
///                       │
///                       ▼
///                     spec        scatter / counts / grouped bars / bins / pivot
/// ```

pub mod request;
pub mod selector;
pub mod spec;

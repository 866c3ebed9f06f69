use serde::{Deserialize, Serialize};




/**
 * Run-time configuration for a distributed container, passed in explicitly
 * rather than read from process-wide state. Neither flag changes the
 * results of an operation: `parallel` only decides whether patches may be
 * visited concurrently (a factory that is not thread safe forces sequential
 * execution regardless), and `verbose` only raises the level of diagnostic
 * log messages.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataOptions {
    pub parallel: bool,
    pub verbose: bool,
}




// ============================================================================
impl DataOptions {

    pub fn sequential() -> Self {
        Self { parallel: false, ..Self::default() }
    }

    pub fn verbose(self) -> Self {
        Self { verbose: true, ..self }
    }
}

impl Default for DataOptions {
    fn default() -> Self {
        Self { parallel: true, verbose: false }
    }
}

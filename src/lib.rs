pub mod blokus;
pub mod mcts;

pub mod utils {
    pub mod prelude {
        pub use anyhow::{anyhow, Context, Error};
        pub type Result<T> = anyhow::Result<T, Error>;

        pub use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
    }
}

pub mod prelude {
    pub use super::blokus::prelude::*;
    pub use super::mcts::prelude::*;
    pub use super::utils::prelude::*;
}

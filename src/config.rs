use burn::prelude::*;

/// Everything the evaluation run needs, fixed once at startup.
#[derive(Config, Debug)]
pub struct EvalConfig {
    /// Root of the dataset; list entries are resolved against it.
    pub data_dir: String,
    /// Two-column list file naming one image and one label map per line.
    pub data_list: String,
    /// Directory scanned for the latest `model-{step}.mpk` snapshot.
    pub snapshot_dir: String,
    /// Where decoded masks go when `save_masks` is set.
    pub save_dir: String,
    /// Explicit checkpoint file; overrides the snapshot directory scan.
    pub restore_from: Option<String>,
    #[config(default = "255")]
    pub ignore_label: usize,
    #[config(default = "19")]
    pub num_classes: usize,
    #[config(default = "500")]
    pub num_steps: usize,
    #[config(default = "false")]
    pub save_masks: bool,
}

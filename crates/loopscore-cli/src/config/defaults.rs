/// Values used when neither the config file nor the command line sets them.
pub struct DefaultsConfig {
    pub model_type: String,
    pub model_version: String,
    pub max_alignment_range: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model_type: "bp".to_string(),
            model_version: "0.6".to_string(),
            max_alignment_range: 20,
        }
    }
}

use super::Config;
use crate::error::ModelPullError;
use config::Config as ConfigBuilder;

const ENV_PREFIX: &str = "MODELPULL";

/// Builds the configuration from built-in defaults, an optional file and
/// `MODELPULL_*` environment variables, in increasing order of precedence.
pub fn load_config(config_path: Option<&str>) -> Result<Config, ModelPullError> {
    let mut builder = ConfigBuilder::builder()
        .add_source(config::Config::try_from(&Config::default())?);

    if let Some(config_path) = config_path {
        builder = builder.add_source(config::File::with_name(config_path));
    }

    let config_builder = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("download.exclude_extensions")
                .with_list_parse_key("download.weight_extensions")
                .try_parsing(true),
        )
        .build()?;

    config_builder.try_deserialize().map_err(Into::into)
}

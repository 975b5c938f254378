//! Environment source: SCREENSHOT__<SECTION>__<KEY>, e.g. SCREENSHOT__PLUGIN__ENDPOINT

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("SCREENSHOT")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}

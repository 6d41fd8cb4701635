use dexter_config::config::{get_config, set_model};
use nu_ansi_term::Color::Green;

use crate::cli::ConfigAction;
use crate::error::Result;
use crate::utils::{print_result, Colored, Icons};

pub fn handle(action: ConfigAction, json: bool) -> Result<()> {
    match action {
        ConfigAction::Get => {
            let config = get_config();
            print_result(json, &config, |config| {
                println!("model:       {}", config.model);
                println!("endpoint:    {}", config.endpoint);
                println!(
                    "personality: {}",
                    config.personality.as_deref().unwrap_or("(default)")
                );
                println!(
                    "local:       {}",
                    if config.is_local_endpoint() { "yes" } else { "no" }
                );
            });
        }
        ConfigAction::SetModel { model } => {
            set_model(&model)?;
            println!("{} model set to {}", Colored(Green, Icons::CHECK), model);
        }
    }
    Ok(())
}

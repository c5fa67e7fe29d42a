use clap::Subcommand;
use focuscycle_core::categories::DEFAULT_COLOR;

use crate::app::App;

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Create a category
    Add {
        /// Display name (1-30 characters)
        name: String,
        /// Display color
        #[arg(long, default_value = DEFAULT_COLOR)]
        color: String,
    },
    /// List categories as JSON
    List,
    /// Rename and recolor a category
    Update {
        id: String,
        name: String,
        #[arg(long, default_value = DEFAULT_COLOR)]
        color: String,
    },
    /// Delete a category
    Delete { id: String },
}

pub fn run(action: CategoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;

    match action {
        CategoryAction::Add { name, color } => {
            let category = app.categories.add(&name, &color)?;
            println!("{}", serde_json::to_string_pretty(&category)?);
        }
        CategoryAction::List => {
            println!("{}", serde_json::to_string_pretty(&app.categories.list())?);
        }
        CategoryAction::Update { id, name, color } => {
            let category = app.categories.update(&id, &name, &color)?;
            println!("{}", serde_json::to_string_pretty(&category)?);
        }
        CategoryAction::Delete { id } => {
            app.categories.delete(&id)?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

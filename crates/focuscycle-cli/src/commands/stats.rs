use focuscycle_core::StudySummary;

use crate::app::App;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;
    let summary = StudySummary::from_categories(&app.categories.list());
    if summary.is_empty() {
        eprintln!("no focus time recorded yet");
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

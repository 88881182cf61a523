// Résumé import: raw document → text → structured CV via the model.

pub mod extract;
pub mod handlers;
pub mod importer;
pub mod prompts;

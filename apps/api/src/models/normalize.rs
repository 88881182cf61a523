//! Post-parse repair of CV records: stable list ids and default skills.

use std::collections::HashSet;

use crate::models::cv::{default_cv, CvData, EducationItem, ExperienceItem, ProjectItem};

/// List entries that carry an `id`.
trait Identified {
    fn id_mut(&mut self) -> &mut String;
}

impl Identified for ExperienceItem {
    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Identified for EducationItem {
    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Identified for ProjectItem {
    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

/// Gives every list entry a unique, non-empty id and fills in default skills.
///
/// Entries without an id (or repeating an earlier id in the same list) get
/// `<kind>_<index>`, e.g. the second project becomes `ai_project_1`.
/// Running this twice yields the same ids.
pub fn ensure_ids(mut cv: CvData) -> CvData {
    assign_ids(&mut cv.experience, "ai_experience");
    assign_ids(&mut cv.education, "ai_education");
    assign_ids(&mut cv.projects, "ai_project");

    if cv.skills.is_empty() {
        cv.skills = default_cv().skills;
    }

    cv
}

fn assign_ids<T: Identified>(items: &mut [T], kind: &str) {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());

    for (index, item) in items.iter_mut().enumerate() {
        let id = item.id_mut();
        if id.trim().is_empty() || seen.contains(id.as_str()) {
            *id = unused_id(&format!("{kind}_{index}"), &seen);
        }
        seen.insert(id.clone());
    }
}

fn unused_id(base: &str, seen: &HashSet<String>) -> String {
    if !seen.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !seen.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

pub mod cv;
pub mod normalize;

pub use cv::{
    parse_cv, parse_section, CvData, EducationItem, ExperienceItem, PersonalInfo, ProjectItem,
    ValidationError,
};
pub use normalize::ensure_ids;

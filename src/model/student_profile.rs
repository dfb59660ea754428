use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::{
    student_certification::StudentCertification, student_education::StudentEducation,
    student_experience::StudentExperience, student_skill::StudentSkill,
};

pub const TABLE_NAME: &str = "public.student_profile";

/// Row of `public.student_profile`. An `id` of 0 marks a profile that has not
/// been inserted yet.
#[derive(Clone, Debug, Default, Deserialize, FromRow, PartialEq)]
pub struct StudentProfile {
    pub id: i32,
    pub user_id: Uuid,
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub cv_path: Option<String>,
    pub motivation_letter_path: Option<String>,
    pub profile_picture: Option<String>,
    pub cover_photo: Option<String>,
    pub created_date: Option<DateTime<FixedOffset>>,
    pub updated_date: Option<DateTime<FixedOffset>>,
}

impl StudentProfile {
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }
}

/// A profile together with the child records it owns. Children are kept in
/// insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileAggregate {
    pub profile: StudentProfile,
    pub educations: Vec<StudentEducation>,
    pub skills: Vec<StudentSkill>,
    pub certifications: Vec<StudentCertification>,
    pub experiences: Vec<StudentExperience>,
}

impl ProfileAggregate {
    /// Point every child back-reference at the profile currently holding it.
    pub fn link_children(&mut self) {
        let profile_id = self.profile.id;
        for item in self.educations.iter_mut() {
            item.student_profile_id = profile_id;
        }
        for item in self.skills.iter_mut() {
            item.student_profile_id = profile_id;
        }
        for item in self.certifications.iter_mut() {
            item.student_profile_id = profile_id;
        }
        for item in self.experiences.iter_mut() {
            item.student_profile_id = profile_id;
        }
    }

    /// Swap in a new set of children wholesale. Nothing from the previous
    /// collections survives.
    pub fn replace_children(&mut self, other: ProfileAggregate) {
        self.educations = other.educations;
        self.skills = other.skills;
        self.certifications = other.certifications;
        self.experiences = other.experiences;
        self.link_children();
    }

    pub fn attachment_paths(&self) -> Vec<String> {
        [
            &self.profile.cv_path,
            &self.profile.motivation_letter_path,
            &self.profile.profile_picture,
            &self.profile.cover_photo,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate_with_children(profile_id: i32) -> ProfileAggregate {
        ProfileAggregate {
            profile: StudentProfile {
                id: profile_id,
                ..Default::default()
            },
            educations: vec![StudentEducation {
                degree: Some("BSc".to_string()),
                ..Default::default()
            }],
            skills: vec![
                StudentSkill {
                    name: "rust".to_string(),
                    ..Default::default()
                },
                StudentSkill {
                    name: "sql".to_string(),
                    student_profile_id: 99,
                    ..Default::default()
                },
            ],
            certifications: vec![StudentCertification {
                name: "cert".to_string(),
                ..Default::default()
            }],
            experiences: vec![StudentExperience {
                title: "intern".to_string(),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_link_children() {
        let mut aggregate = aggregate_with_children(7);
        aggregate.link_children();
        assert!(aggregate.educations.iter().all(|x| x.student_profile_id == 7));
        assert!(aggregate.skills.iter().all(|x| x.student_profile_id == 7));
        assert!(aggregate
            .certifications
            .iter()
            .all(|x| x.student_profile_id == 7));
        assert!(aggregate.experiences.iter().all(|x| x.student_profile_id == 7));
    }

    #[test]
    fn test_replace_children_drops_previous() {
        let mut existing = aggregate_with_children(3);
        let incoming = ProfileAggregate {
            skills: vec![StudentSkill {
                name: "go".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        existing.replace_children(incoming);
        assert!(existing.educations.is_empty());
        assert!(existing.certifications.is_empty());
        assert!(existing.experiences.is_empty());
        assert_eq!(existing.skills.len(), 1);
        assert_eq!(existing.skills[0].name, "go");
        assert_eq!(existing.skills[0].student_profile_id, 3);
    }

    #[test]
    fn test_attachment_paths_skips_missing() {
        let aggregate = ProfileAggregate {
            profile: StudentProfile {
                cv_path: Some("/tmp/cv.pdf".to_string()),
                cover_photo: Some("/tmp/cover.png".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            aggregate.attachment_paths(),
            vec!["/tmp/cv.pdf".to_string(), "/tmp/cover.png".to_string()]
        );
        assert!(!aggregate.profile.is_persisted());
    }
}

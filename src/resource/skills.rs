use crate::model::{Complexity, Resource, Task};

/// Skills a task needs: declared requirements, the category tag, and senior
/// tags for expert work. Lowercased and deduplicated.
pub fn required_skills(task: &Task) -> Vec<String> {
    let mut skills: Vec<String> = task
        .skill_requirements
        .iter()
        .map(|r| r.name.to_lowercase())
        .collect();

    if let Some(tag) = task.category.skill_tag() {
        skills.push(tag.to_string());
    }

    if task.complexity == Complexity::Expert {
        skills.push("senior".to_string());
        skills.push("architecture".to_string());
    }

    skills.sort();
    skills.dedup();
    skills
}

/// Share of required skills the resource covers, using a case-insensitive
/// substring match in either direction.
pub fn skill_match(resource: &Resource, required: &[String]) -> f64 {
    if required.is_empty() {
        return 1.0;
    }

    let owned: Vec<String> = resource.skills.iter().map(|s| s.to_lowercase()).collect();
    let present = required
        .iter()
        .filter(|req| {
            owned
                .iter()
                .any(|have| have.contains(req.as_str()) || req.contains(have.as_str()))
        })
        .count();

    present as f64 / required.len() as f64
}

pub fn missing_skills(resource: &Resource, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|req| skill_match(resource, std::slice::from_ref(*req)) == 0.0)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResourceType, SkillLevel, SkillRequirement, TaskCategory};

    #[test]
    fn test_required_skills_expert_tags() {
        let mut task = Task::new("t", "Core engine")
            .with_category(TaskCategory::Development)
            .with_complexity(Complexity::Expert);
        task.skill_requirements
            .push(SkillRequirement::new("Rust", SkillLevel::Senior));

        assert_eq!(
            required_skills(&task),
            vec!["architecture", "development", "rust", "senior"]
        );
    }

    #[test]
    fn test_skill_match_substring_case_insensitive() {
        let resource = Resource::new("r", "Dev", ResourceType::Human)
            .with_skills(&["Backend Development", "RUST"]);
        let required = vec!["rust".to_string(), "development".to_string(), "sql".to_string()];
        let score = skill_match(&resource, &required);
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(missing_skills(&resource, &required), vec!["sql".to_string()]);
    }

    #[test]
    fn test_no_requirements_is_full_match() {
        let resource = Resource::new("r", "Anyone", ResourceType::Human);
        assert_eq!(skill_match(&resource, &[]), 1.0);
    }
}

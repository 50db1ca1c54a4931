//! Batch auto-organization of unteamed students into teams.
//!
//! [`plan`] is a pure function from a cohort snapshot to an
//! [`OrganizerPlan`]; the API layer applies the plan in one transaction.
//! Randomness is injected so tests can use a seeded generator.

use rand::Rng;
use serde::Serialize;

use crate::cohort::{Specialty, Year};
use crate::team::{is_full, min_viable_size, TeamPolicy};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A student of the cohort being organized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CohortStudent {
    pub student_id: DbId,
    pub year: Year,
    pub specialite: Option<Specialty>,
    pub team_id: Option<DbId>,
}

/// An existing team with at least one member in the cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CohortTeam {
    pub team_id: DbId,
    pub max_number: i32,
    /// All members, whatever their cohort.
    pub member_count: i64,
    /// Members belonging to the cohort being organized.
    pub cohort_member_count: i64,
    pub year: Option<Year>,
    pub specialite: Option<Specialty>,
}

#[derive(Debug, Clone)]
pub struct OrganizerInput {
    pub year: Year,
    /// Capacity of freshly built teams (session override or year default).
    pub capacity: i32,
    /// Cohort students in stable input order.
    pub students: Vec<CohortStudent>,
    pub teams: Vec<CohortTeam>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Target of an assignment: an existing team or the n-th new team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TeamSlot {
    Existing(DbId),
    New(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTeam {
    pub max_number: i32,
    pub year: Year,
    pub specialite: Option<Specialty>,
    pub full: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub student_id: DbId,
    pub team: TeamSlot,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizerPlan {
    /// Existing teams to destroy before any assignment.
    pub dissolved: Vec<DbId>,
    pub new_teams: Vec<NewTeam>,
    pub assignments: Vec<Assignment>,
    /// Existing teams that reach capacity through this plan.
    pub filled: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Candidate {
    slot: TeamSlot,
    max_number: i32,
    count: i64,
    year: Year,
    specialite: Option<Specialty>,
}

impl Candidate {
    fn accepts(&self, student: &CohortStudent) -> bool {
        self.year == student.year
            && (!student.year.teams_share_specialty() || self.specialite == student.specialite)
    }
}

struct Planner<'a, R: Rng> {
    policy: &'a TeamPolicy,
    rng: &'a mut R,
    pool: Vec<Candidate>,
    plan: OrganizerPlan,
}

impl<R: Rng> Planner<'_, R> {
    fn compatible(&self, student: &CohortStudent) -> Vec<usize> {
        self.pool
            .iter()
            .enumerate()
            .filter(|(_, c)| c.accepts(student) && self.policy.in_organizer_pool(c.count))
            .map(|(i, _)| i)
            .collect()
    }

    fn pick(&mut self, indices: &[usize]) -> Option<usize> {
        if indices.is_empty() {
            None
        } else {
            Some(indices[self.rng.random_range(0..indices.len())])
        }
    }

    fn assign(&mut self, student: &CohortStudent, pool_index: usize) {
        let candidate = &mut self.pool[pool_index];
        let was_full = is_full(candidate.count, candidate.max_number);
        candidate.count += 1;
        let now_full = is_full(candidate.count, candidate.max_number);
        let slot = candidate.slot;

        self.plan.assignments.push(Assignment {
            student_id: student.student_id,
            team: slot,
        });
        if now_full && !was_full {
            match slot {
                TeamSlot::Existing(id) => self.plan.filled.push(id),
                TeamSlot::New(i) => self.plan.new_teams[i].full = true,
            }
        }
    }

    fn create_team(&mut self, template: &CohortStudent, max_number: i32) -> usize {
        let index = self.plan.new_teams.len();
        self.plan.new_teams.push(NewTeam {
            max_number,
            year: template.year,
            specialite: template.specialite,
            full: false,
        });
        self.pool.push(Candidate {
            slot: TeamSlot::New(index),
            max_number,
            count: 0,
            year: template.year,
            specialite: template.specialite,
        });
        self.pool.len() - 1
    }

    /// Random compatible team, or a new team when none exists.
    fn place_overflow(&mut self, student: &CohortStudent, capacity: i32) {
        let compatible = self.compatible(student);
        let index = match self.pick(&compatible) {
            Some(i) => i,
            None => self.create_team(student, capacity),
        };
        self.assign(student, index);
    }
}

/// Build the organization plan for one cohort.
pub fn plan<R: Rng>(
    input: &OrganizerInput,
    policy: &TeamPolicy,
    rng: &mut R,
) -> OrganizerPlan {
    let mut planner = Planner {
        policy,
        rng,
        pool: Vec::new(),
        plan: OrganizerPlan::default(),
    };

    // 1. Dissolve weak teams.
    for team in &input.teams {
        if team.cohort_member_count < min_viable_size(team.max_number) {
            planner.plan.dissolved.push(team.team_id);
        } else if let Some(year) = team.year {
            planner.pool.push(Candidate {
                slot: TeamSlot::Existing(team.team_id),
                max_number: team.max_number,
                count: team.member_count,
                year,
                specialite: team.specialite,
            });
        }
    }

    let unteamed: Vec<CohortStudent> = input
        .students
        .iter()
        .filter(|s| match s.team_id {
            None => true,
            Some(id) => planner.plan.dissolved.contains(&id),
        })
        .copied()
        .collect();

    // 2. Final-year projects are individual.
    if input.year == Year::ThirdCs {
        for student in &unteamed {
            let index = planner.create_team(student, policy.solo_capacity);
            planner.assign(student, index);
        }
        return planner.plan;
    }

    // 3. Pack into compatible existing teams.
    let overflow_threshold = min_viable_size(input.capacity) as usize;
    let mut leftover: Vec<CohortStudent> = Vec::new();
    for (i, student) in unteamed.iter().enumerate() {
        let compatible = planner.compatible(student);
        let open: Vec<usize> = compatible
            .iter()
            .copied()
            .filter(|&c| {
                let cand = &planner.pool[c];
                !is_full(cand.count, cand.max_number)
            })
            .collect();

        let remaining = leftover.len() + (unteamed.len() - i);
        let target = match planner.pick(&open) {
            Some(c) => Some(c),
            None if remaining < overflow_threshold => planner.pick(&compatible),
            None => None,
        };
        match target {
            Some(c) => planner.assign(student, c),
            None => leftover.push(*student),
        }
    }

    // 4. Fresh full-capacity teams per compatibility group, then overflow.
    let mut groups: Vec<Vec<CohortStudent>> = Vec::new();
    for student in leftover {
        let key_matches = |g: &Vec<CohortStudent>| {
            let head = &g[0];
            head.year == student.year
                && (!student.year.teams_share_specialty() || head.specialite == student.specialite)
        };
        match groups.iter_mut().find(|g| key_matches(g)) {
            Some(group) => group.push(student),
            None => groups.push(vec![student]),
        }
    }

    let chunk = input.capacity.max(1) as usize;
    for group in groups {
        let full_chunks = group.len() / chunk;
        for members in group.chunks(chunk).take(full_chunks) {
            let index = planner.create_team(&members[0], input.capacity);
            for member in members {
                planner.assign(member, index);
            }
        }

        let remainder = &group[full_chunks * chunk..];
        if remainder.is_empty() {
            continue;
        }
        if remainder.len() < overflow_threshold {
            for student in remainder {
                planner.place_overflow(student, input.capacity);
            }
        } else {
            let index = planner.create_team(&remainder[0], input.capacity);
            for student in remainder {
                planner.assign(student, index);
            }
        }
    }

    planner.plan
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn student(id: DbId, year: Year, spec: Option<Specialty>, team: Option<DbId>) -> CohortStudent {
        CohortStudent {
            student_id: id,
            year,
            specialite: spec,
            team_id: team,
        }
    }

    fn team(id: DbId, count: i64, year: Year, spec: Option<Specialty>) -> CohortTeam {
        CohortTeam {
            team_id: id,
            max_number: 5,
            member_count: count,
            cohort_member_count: count,
            year: Some(year),
            specialite: spec,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn sizes(plan: &OrganizerPlan) -> HashMap<TeamSlot, usize> {
        let mut sizes = HashMap::new();
        for a in &plan.assignments {
            *sizes.entry(a.team).or_insert(0) += 1;
        }
        sizes
    }

    #[test]
    fn weak_teams_are_dissolved_and_members_reassigned() {
        let input = OrganizerInput {
            year: Year::FirstCs,
            capacity: 5,
            students: vec![
                student(1, Year::FirstCs, None, Some(100)),
                student(2, Year::FirstCs, None, Some(100)),
                student(3, Year::FirstCs, None, None),
            ],
            teams: vec![team(100, 2, Year::FirstCs, None)],
        };
        let plan = plan(&input, &TeamPolicy::default(), &mut rng());
        assert_eq!(plan.dissolved, vec![100]);
        assert_eq!(plan.assignments.len(), 3);
        assert!(plan
            .assignments
            .iter()
            .all(|a| a.team != TeamSlot::Existing(100)));
    }

    #[test]
    fn final_year_students_get_solo_full_teams() {
        let input = OrganizerInput {
            year: Year::ThirdCs,
            capacity: 2,
            students: vec![
                student(1, Year::ThirdCs, Some(Specialty::Isi), None),
                student(2, Year::ThirdCs, Some(Specialty::Siw), None),
            ],
            teams: vec![],
        };
        let plan = plan(&input, &TeamPolicy::default(), &mut rng());
        assert_eq!(plan.new_teams.len(), 2);
        assert!(plan.new_teams.iter().all(|t| t.max_number == 1 && t.full));
        assert_eq!(plan.assignments.len(), 2);
    }

    #[test]
    fn students_fill_open_compatible_teams_first() {
        let input = OrganizerInput {
            year: Year::SecondCs,
            capacity: 5,
            students: vec![
                student(1, Year::SecondCs, Some(Specialty::Isi), None),
                student(2, Year::SecondCs, Some(Specialty::Siw), None),
            ],
            teams: vec![
                team(10, 4, Year::SecondCs, Some(Specialty::Isi)),
                team(11, 4, Year::SecondCs, Some(Specialty::Siw)),
            ],
        };
        let plan = plan(&input, &TeamPolicy::default(), &mut rng());
        assert!(plan.new_teams.is_empty());
        assert!(plan.assignments.contains(&Assignment {
            student_id: 1,
            team: TeamSlot::Existing(10)
        }));
        assert!(plan.assignments.contains(&Assignment {
            student_id: 2,
            team: TeamSlot::Existing(11)
        }));
        let mut filled = plan.filled.clone();
        filled.sort_unstable();
        assert_eq!(filled, vec![10, 11]);
    }

    #[test]
    fn large_remainder_forms_fresh_teams_in_input_order() {
        let students: Vec<CohortStudent> = (1..=12)
            .map(|id| student(id, Year::FirstCs, None, None))
            .collect();
        let input = OrganizerInput {
            year: Year::FirstCs,
            capacity: 5,
            students,
            teams: vec![],
        };
        let plan = plan(&input, &TeamPolicy::default(), &mut rng());
        // 12 = 5 + 5 + 2; the 2 left over are below the threshold (4) and
        // overflow into the fresh teams.
        assert_eq!(plan.new_teams.len(), 2);
        assert_eq!(plan.assignments.len(), 12);
        assert_eq!(plan.assignments[0].team, TeamSlot::New(0));
        assert_eq!(plan.assignments[5].team, TeamSlot::New(1));
        for size in sizes(&plan).values() {
            assert!((*size as i64) < crate::team::ORGANIZER_POOL_CEILING);
        }
    }

    #[test]
    fn remainder_at_threshold_forms_its_own_team() {
        let students: Vec<CohortStudent> = (1..=9)
            .map(|id| student(id, Year::FirstCs, None, None))
            .collect();
        let input = OrganizerInput {
            year: Year::FirstCs,
            capacity: 5,
            students,
            teams: vec![],
        };
        let plan = plan(&input, &TeamPolicy::default(), &mut rng());
        // 9 = 5 + 4; 4 is not below the threshold, so it becomes a team.
        assert_eq!(plan.new_teams.len(), 2);
        assert!(plan.new_teams[0].full);
        assert!(!plan.new_teams[1].full);
    }

    #[test]
    fn second_cs_groups_never_mix_specialties() {
        let mut students = Vec::new();
        for id in 1..=5 {
            students.push(student(id, Year::SecondCs, Some(Specialty::Isi), None));
        }
        for id in 6..=10 {
            students.push(student(id, Year::SecondCs, Some(Specialty::Iasd), None));
        }
        let input = OrganizerInput {
            year: Year::SecondCs,
            capacity: 5,
            students: students.clone(),
            teams: vec![],
        };
        let plan = plan(&input, &TeamPolicy::default(), &mut rng());
        assert_eq!(plan.new_teams.len(), 2);
        for a in &plan.assignments {
            let s = students.iter().find(|s| s.student_id == a.student_id).unwrap();
            let TeamSlot::New(i) = a.team else {
                panic!("expected a new team");
            };
            assert_eq!(plan.new_teams[i].specialite, s.specialite);
        }
    }

    #[test]
    fn teams_at_pool_ceiling_receive_no_one() {
        let mut crowded = team(10, 8, Year::FirstCs, None);
        crowded.max_number = 10;
        let input = OrganizerInput {
            year: Year::FirstCs,
            capacity: 5,
            students: vec![student(1, Year::FirstCs, None, None)],
            teams: vec![crowded],
        };
        let plan = plan(&input, &TeamPolicy::default(), &mut rng());
        assert_eq!(plan.new_teams.len(), 1);
        assert_eq!(plan.assignments[0].team, TeamSlot::New(0));
    }

    #[test]
    fn tiny_remainder_packs_into_full_team() {
        let input = OrganizerInput {
            year: Year::FirstCs,
            capacity: 5,
            students: vec![student(1, Year::FirstCs, None, None)],
            teams: vec![team(10, 5, Year::FirstCs, None)],
        };
        let plan = plan(&input, &TeamPolicy::default(), &mut rng());
        assert!(plan.new_teams.is_empty());
        assert_eq!(plan.assignments[0].team, TeamSlot::Existing(10));
        assert!(plan.filled.is_empty());
    }
}

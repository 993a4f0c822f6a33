use crate::error::{AppError, AppResult};
use crate::models::{Difficulty, Language, Problem, TestCase};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::seq::IndexedRandom;

static SEED_CATALOG: Lazy<Vec<Problem>> = Lazy::new(seed_catalog);

/// Catalog seam. Selection must return `count` distinct problems matching
/// both filters or fail outright.
#[async_trait]
pub trait ProblemProvider: Send + Sync {
    async fn select_problems(
        &self,
        difficulty: Difficulty,
        language: Language,
        count: usize,
    ) -> AppResult<Vec<Problem>>;
}

/// In-process provider backed by a fixed catalog. Selection is a random
/// distinct sample so repeated sessions do not always get the same set.
pub struct SeededProblemProvider {
    catalog: Vec<Problem>,
}

impl SeededProblemProvider {
    pub fn new() -> Self {
        Self {
            catalog: SEED_CATALOG.clone(),
        }
    }

    pub fn with_catalog(catalog: Vec<Problem>) -> Self {
        Self { catalog }
    }
}

impl Default for SeededProblemProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProblemProvider for SeededProblemProvider {
    async fn select_problems(
        &self,
        difficulty: Difficulty,
        language: Language,
        count: usize,
    ) -> AppResult<Vec<Problem>> {
        let matching: Vec<&Problem> = self
            .catalog
            .iter()
            .filter(|p| p.difficulty == difficulty && p.language == language)
            .collect();

        if matching.len() < count {
            return Err(AppError::Validation(format!(
                "not enough {difficulty} {language} problems available (need {count}, have {})",
                matching.len()
            )));
        }

        let mut rng = rand::rng();
        Ok(matching
            .choose_multiple(&mut rng, count)
            .map(|p| (*p).clone())
            .collect())
    }
}

fn problem(
    id: i64,
    title: &str,
    difficulty: Difficulty,
    description: &str,
    starter_code: &str,
    test_cases: &[(&str, &str)],
) -> Problem {
    Problem {
        id,
        title: title.to_string(),
        difficulty,
        language: Language::Python,
        description: description.to_string(),
        starter_code: starter_code.to_string(),
        test_cases: test_cases
            .iter()
            .map(|(input, expected_output)| TestCase {
                input: (*input).to_string(),
                expected_output: (*expected_output).to_string(),
            })
            .collect(),
    }
}

fn seed_catalog() -> Vec<Problem> {
    vec![
        problem(
            1,
            "Reverse a String",
            Difficulty::Junior,
            "Write a function that returns the input string reversed.",
            "def reverse_string(s: str) -> str:\n    pass\n",
            &[("hello", "olleh"), ("ab", "ba")],
        ),
        problem(
            2,
            "FizzBuzz",
            Difficulty::Junior,
            "Return a list of strings for 1..n where multiples of 3 are \"Fizz\", multiples of 5 are \"Buzz\" and multiples of both are \"FizzBuzz\".",
            "def fizzbuzz(n: int) -> list[str]:\n    pass\n",
            &[("5", "['1', '2', 'Fizz', '4', 'Buzz']")],
        ),
        problem(
            3,
            "Sum of Digits",
            Difficulty::Junior,
            "Given a non-negative integer, return the sum of its digits.",
            "def digit_sum(n: int) -> int:\n    pass\n",
            &[("123", "6"), ("0", "0")],
        ),
        problem(
            4,
            "Two Sum",
            Difficulty::Middle,
            "Given a list of integers and a target, return the indices of the two numbers that add up to the target.",
            "def two_sum(nums: list[int], target: int) -> list[int]:\n    pass\n",
            &[("[2, 7, 11, 15], 9", "[0, 1]")],
        ),
        problem(
            5,
            "Balanced Brackets",
            Difficulty::Middle,
            "Return True if every opening bracket in the string is closed in the correct order.",
            "def is_balanced(s: str) -> bool:\n    pass\n",
            &[("([]{})", "True"), ("([)]", "False")],
        ),
        problem(
            6,
            "LRU Cache",
            Difficulty::Senior,
            "Implement an LRU cache with get and put in O(1) amortized time.",
            "class LRUCache:\n    def __init__(self, capacity: int):\n        pass\n\n    def get(self, key: int) -> int:\n        pass\n\n    def put(self, key: int, value: int) -> None:\n        pass\n",
            &[("capacity=2; put(1,1); put(2,2); get(1)", "1")],
        ),
    ]
}

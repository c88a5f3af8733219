//! Person records as the ancestor data source reports them.

use serde::{Deserialize, Serialize};

/// Opaque identifier assigned by the data source.
pub type PersonId = String;

/// Name parts for one person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub given: String,
    #[serde(default)]
    pub middle: Option<String>,
    /// Family name at birth.
    #[serde(default)]
    pub surname_at_birth: Option<String>,
    /// Family name currently in use, when it differs.
    #[serde(default)]
    pub surname_current: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
}

impl PersonName {
    pub fn new(given: impl Into<String>, surname: impl Into<String>) -> Self {
        Self {
            given: given.into(),
            surname_at_birth: Some(surname.into()),
            ..Self::default()
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    /// Surname preferred for display: the birth name, then the current one.
    pub fn surname(&self) -> Option<&str> {
        self.surname_at_birth.as_deref().or(self.surname_current.as_deref())
    }

    /// "Given Surname", preferring the nickname when one exists.
    pub fn display_name(&self) -> String {
        let given = self.nickname.as_deref().unwrap_or(&self.given);
        match self.surname() {
            Some(surname) => format!("{} {}", given, surname),
            None => given.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unspecified,
}

/// A date as the source knows it: exact, or only to the decade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventDate {
    Exact { year: i32, month: u8, day: u8 },
    Decade { start_year: i32 },
}

impl EventDate {
    pub fn year(&self) -> i32 {
        match self {
            EventDate::Exact { year, .. } => *year,
            EventDate::Decade { start_year } => *start_year,
        }
    }

    /// "1874" for exact dates, "1870s" for decade-level ones.
    pub fn display(&self) -> String {
        match self {
            EventDate::Exact { year, .. } => year.to_string(),
            EventDate::Decade { start_year } => format!("{}s", start_year),
        }
    }
}

/// A birth or death as reported: optional date and place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeEvent {
    #[serde(default)]
    pub date: Option<EventDate>,
    #[serde(default)]
    pub place: Option<String>,
}

/// One fetched ancestor record.
///
/// Immutable once fetched, except through [`Person::merge_from`]: the
/// source returns overlapping, partially-populated records for the same
/// person across relative fetches, and merging fills gaps without ever
/// overwriting known data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: PersonName,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub birth: LifeEvent,
    #[serde(default)]
    pub death: LifeEvent,
    #[serde(default)]
    pub father: Option<PersonId>,
    #[serde(default)]
    pub mother: Option<PersonId>,
    #[serde(default)]
    pub private: bool,
}

impl Person {
    pub fn new(id: impl Into<PersonId>, name: PersonName) -> Self {
        Self {
            id: id.into(),
            name,
            ..Self::default()
        }
    }

    pub fn with_parents(
        mut self,
        father: Option<impl Into<PersonId>>,
        mother: Option<impl Into<PersonId>>,
    ) -> Self {
        self.father = father.map(Into::into);
        self.mother = mother.map(Into::into);
        self
    }

    pub fn display_name(&self) -> String {
        if self.private {
            "Private".to_string()
        } else {
            self.name.display_name()
        }
    }

    /// "1874–1923" style span; decade dates render as "1870s". Empty
    /// when neither date is known.
    pub fn lifespan(&self) -> String {
        let birth = self.birth.date.map(|d| d.display());
        let death = self.death.date.map(|d| d.display());
        match (birth, death) {
            (None, None) => String::new(),
            (b, d) => format!(
                "{}–{}",
                b.unwrap_or_default(),
                d.unwrap_or_default()
            ),
        }
    }

    /// Fill fields this record is missing from another fetch of the
    /// same person. Known data is never overwritten.
    pub fn merge_from(&mut self, other: &Person) {
        if self.name.given.is_empty() {
            self.name.given = other.name.given.clone();
        }
        merge_option(&mut self.name.middle, &other.name.middle);
        merge_option(&mut self.name.surname_at_birth, &other.name.surname_at_birth);
        merge_option(&mut self.name.surname_current, &other.name.surname_current);
        merge_option(&mut self.name.nickname, &other.name.nickname);
        merge_option(&mut self.name.prefix, &other.name.prefix);
        merge_option(&mut self.name.suffix, &other.name.suffix);
        if self.gender == Gender::Unspecified {
            self.gender = other.gender;
        }
        merge_option(&mut self.birth.date, &other.birth.date);
        merge_option(&mut self.birth.place, &other.birth.place);
        merge_option(&mut self.death.date, &other.death.date);
        merge_option(&mut self.death.place, &other.death.place);
        merge_option(&mut self.father, &other.father);
        merge_option(&mut self.mother, &other.mother);
        self.private = self.private || other.private;
    }
}

fn merge_option<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
    if target.is_none() {
        *target = source.clone();
    }
}

//! Static reference lists used by the forms and the typeahead.

pub const UNIVERSITIES: &[&str] = &[
    "The University of Western Australia",
    "Curtin University",
    "Murdoch University",
    "Edith Cowan University",
    "The University of Notre Dame Australia",
    "The University of Adelaide",
    "Flinders University",
    "University of South Australia",
    "Adelaide University",
    "The University of Melbourne",
    "Monash University",
    "RMIT University",
    "Deakin University",
    "La Trobe University",
    "Swinburne University of Technology",
    "Victoria University",
    "Federation University Australia",
    "Australian Catholic University",
    "The University of Sydney",
    "UNSW Sydney",
    "University of Technology Sydney",
    "Macquarie University",
    "Western Sydney University",
    "University of Wollongong",
    "University of Newcastle",
    "Charles Sturt University",
    "Southern Cross University",
    "University of New England",
    "The Australian National University",
    "University of Canberra",
    "The University of Queensland",
    "Queensland University of Technology",
    "Griffith University",
    "James Cook University",
    "Bond University",
    "University of the Sunshine Coast",
    "CQUniversity",
    "University of Southern Queensland",
    "University of Tasmania",
    "Charles Darwin University",
    "Torrens University Australia",
];

pub const MAJORS: &[&str] = &[
    "Accounting",
    "Actuarial Science",
    "Anatomy",
    "Biochemistry",
    "Biology",
    "Biomedical Science",
    "Business",
    "Chemistry",
    "Civil Engineering",
    "Commerce",
    "Computer Science",
    "Criminology",
    "Data Science",
    "Economics",
    "Education",
    "Electrical Engineering",
    "Environmental Science",
    "Finance",
    "Human Biology",
    "Information Technology",
    "Law",
    "Marketing",
    "Mathematics",
    "Mechanical Engineering",
    "Medicine",
    "Nursing",
    "Philosophy",
    "Physics",
    "Politics",
    "Psychology",
    "Software Engineering",
    "Statistics",
    "Other",
];

/// Looks a name up case-insensitively and returns the listed spelling.
pub fn canonical<'a>(list: &[&'a str], name: &str) -> Option<&'a str> {
    let name = name.trim();
    list.iter().copied().find(|n| n.eq_ignore_ascii_case(name))
}

use crate::types::Human;

/// The example population written by `HumanStore::seed_humans`.
pub fn example_humans() -> Vec<Human> {
    vec![
        Human::new("Alice", "Walker", "1990-03-12", false, "Loves long walks and dogs."),
        Human::new("Bob", "Smith", "1985-07-22", true, "Allergic but determined."),
        Human::new("Charlie", "Johnson", "1992-11-02", false, "Works from home."),
        Human::new("Diana", "Brown", "1988-01-17", false, "Very active lifestyle."),
        Human::new("Ethan", "Davis", "1995-09-30", false, "Enjoys hiking."),
        Human::new("Fiona", "Miller", "1991-04-05", true, "Cat person trying dogs."),
        Human::new("George", "Wilson", "1983-12-11", false, "Has a big yard."),
        Human::new("Hannah", "Moore", "1998-06-19", false, "First-time pet owner."),
        Human::new("Ian", "Taylor", "1987-08-08", false, "Experienced with rescues."),
        Human::new("Julia", "Anderson", "1993-10-25", false, "Looking for a running buddy."),
    ]
}

//! Out-of-the-box data for a fresh shop: services, team and weekly hours.

use std::collections::HashMap;

use chrono::Weekday;

use crate::models::{Barber, DayHours, OpeningHours, Service, ServiceCategory, WorkingWindow};

pub fn default_services() -> Vec<Service> {
    use ServiceCategory::{Classic, Premium};

    let entries: [(&str, &str, u32, f64, ServiceCategory); 16] = [
        ("1", "Taglio Uomo Classic", 30, 18.0, Classic),
        ("2", "Taglio Uomo Styling", 45, 25.0, Classic),
        ("3", "Taglio Bambino (0-12 anni)", 25, 14.0, Classic),
        ("4", "Taglio Ragazzo (13-17 anni)", 30, 16.0, Classic),
        ("5", "Barba Completa", 30, 15.0, Classic),
        ("6", "Barba Rifinitura", 15, 10.0, Classic),
        ("7", "Taglio + Barba Completa", 50, 30.0, Classic),
        ("8", "Taglio + Barba Rifinitura", 40, 25.0, Classic),
        ("9", "Shampoo + Piega", 20, 12.0, Classic),
        ("10", "Trattamento Anticaduta", 30, 20.0, Classic),
        ("11", "Colorazione Barba", 25, 18.0, Classic),
        ("12", "Rasatura Completa", 20, 12.0, Classic),
        ("13", "Royal Treatment", 75, 50.0, Premium),
        ("14", "Trattamento Viso Uomo", 40, 35.0, Premium),
        ("15", "Disegno Barba/Capelli", 20, 15.0, Premium),
        ("16", "Colorazione Capelli Uomo", 60, 40.0, Premium),
    ];

    entries
        .into_iter()
        .map(|(id, name, duration, price, category)| Service {
            id: id.to_string(),
            name: name.to_string(),
            duration,
            price,
            category,
        })
        .collect()
}

pub fn default_team() -> Vec<Barber> {
    use Weekday::{Fri, Mon, Sat, Thu, Tue, Wed};

    let barber = |id: &str, name: &str, role: &str, days: &[Weekday], color: &str| Barber {
        id: id.to_string(),
        name: name.to_string(),
        role: role.to_string(),
        availability: days.to_vec(),
        color: color.to_string(),
        image_url: format!("https://picsum.photos/seed/{id}/200"),
    };

    vec![
        barber(
            "alberto",
            "Alberto",
            "Titolare / Barbiere Senior",
            &[Mon, Tue, Wed, Thu, Fri, Sat],
            "#D5963B",
        ),
        barber("marco", "Marco", "Barbiere", &[Mon, Tue, Wed, Thu, Fri, Sat], "#3B82F6"),
        barber("luca", "Luca", "Barbiere", &[Mon, Tue, Wed, Thu, Fri], "#10B981"),
        barber("simone", "Simone", "Barbiere", &[Tue, Wed, Thu, Fri, Sat], "#EF4444"),
    ]
}

pub fn default_opening_hours() -> OpeningHours {
    let open = |from: (u32, u32), to: (u32, u32)| WorkingWindow::Open {
        open: chrono::NaiveTime::from_hms_opt(from.0, from.1, 0).unwrap_or_default(),
        close: chrono::NaiveTime::from_hms_opt(to.0, to.1, 0).unwrap_or_default(),
    };

    let weekday_hours = DayHours {
        morning: open((9, 0), (13, 0)),
        afternoon: open((14, 30), (19, 0)),
    };
    let saturday_hours = DayHours {
        morning: open((8, 30), (13, 0)),
        afternoon: open((14, 0), (18, 0)),
    };

    let mut days = HashMap::new();
    for day in [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri] {
        days.insert(day, weekday_hours);
    }
    days.insert(Weekday::Sat, saturday_hours);
    days.insert(Weekday::Sun, DayHours::CLOSED);

    OpeningHours::new(days)
}

/// A partial representation of a ticket record from the ticketing provider.
///
/// Tickets are cached keyed by barcode and replaced wholesale on each refresh
/// cycle; registration looks them up by barcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    /// Unique key for the ticket. Duplicates across a guest list are resolved
    /// last-write-wins with a warning.
    pub barcode: String,
    pub valid: bool,
    pub first_name: String,
    pub surname: String,
    pub ticket_type: String,
}

impl Ticket {
    /// The holder's full name, as used for the Discord nickname.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_joins_name_parts() {
        let ticket = Ticket {
            barcode: "123".to_string(),
            valid: true,
            first_name: "Grace".to_string(),
            surname: "Hopper".to_string(),
            ticket_type: "General".to_string(),
        };
        assert_eq!(ticket.full_name(), "Grace Hopper");
    }
}

use common::ArtistCredit;

// Last prompted split only.
#[derive(Debug, Default)]
pub struct DecisionLog {
    last: Option<(String, ArtistCredit)>,
}

impl DecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replay(&self, raw: &str) -> Option<&ArtistCredit> {
        match &self.last {
            Some((last_raw, credit)) if last_raw == raw => Some(credit),
            _ => None,
        }
    }

    pub fn record(&mut self, raw: String, credit: ArtistCredit) {
        self.last = Some((raw, credit));
    }
}

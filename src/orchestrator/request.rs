//! Trip requests and the queries derived from them

pub const DEFAULT_DESTINATION: &str = "Tokyo";
pub const DEFAULT_DEPARTURE: &str = "Paris";
pub const DEFAULT_LANGUAGE: &str = "English";

/// Fixed budget query sent to the calculator
// TODO: derive nights and nightly rate from the request once the input format carries them
pub const BUDGET_QUERY: &str = "Calculate trip budget for 7 nights at $150 per night with $25 meals per day";

/// `destination, departure, language` with defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRequest {
    pub destination: String,
    pub departure: String,
    pub language: String,
}

impl TripRequest {
    /// Parse comma-separated fields; blank or missing ones take defaults
    pub fn parse(text: &str) -> Self {
        let mut fields = text.split(',').map(str::trim);
        let mut next = |default: &str| {
            fields
                .next()
                .filter(|field| !field.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        Self {
            destination: next(DEFAULT_DESTINATION),
            departure: next(DEFAULT_DEPARTURE),
            language: next(DEFAULT_LANGUAGE),
        }
    }

    /// Reports are drafted in English; anything else goes through translation
    pub fn needs_translation(&self) -> bool {
        !self.language.eq_ignore_ascii_case("english")
    }

    pub fn activities_query(&self) -> String {
        format!("best things to do and top attractions in {}", self.destination)
    }

    pub fn weather_query(&self) -> String {
        format!("What is the weather in {}?", self.destination)
    }

    pub fn translation_query(&self, text: &str) -> String {
        format!("Translate to {}:\n\n{}", self.language, text)
    }

    pub fn title(&self) -> String {
        format!("Travel Plan: {} to {}", self.departure, self.destination)
    }
}

impl Default for TripRequest {
    fn default() -> Self {
        Self::parse("")
    }
}

/// Everything the itinerary draft is composed from
#[derive(Debug, Clone, Copy)]
pub struct ItineraryBrief<'a> {
    pub departure: &'a str,
    pub destination: &'a str,
    pub activities: &'a str,
    pub weather: &'a str,
    pub budget: &'a str,
}

impl ItineraryBrief<'_> {
    /// Prompt for a generative composer
    pub fn prompt(&self) -> String {
        format!(
            "Create a 1-day travel itinerary from {} to {} in at most 500 characters.\n\n\
             Context:\n- Activities: {}\n- Weather: {}\n- Budget: {}\n\n\
             Include morning, afternoon, and evening activities. Keep it simple and concise.",
            self.departure, self.destination, self.activities, self.weather, self.budget
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_field_takes_defaults() {
        let trip = TripRequest::parse("Tokyo");
        assert_eq!(trip.destination, "Tokyo");
        assert_eq!(trip.departure, "Paris");
        assert_eq!(trip.language, "English");
    }

    #[test]
    fn test_two_fields_default_language() {
        let trip = TripRequest::parse("Rome, Berlin");
        assert_eq!(trip.destination, "Rome");
        assert_eq!(trip.departure, "Berlin");
        assert_eq!(trip.language, "English");
    }

    #[test]
    fn test_blank_fields_take_defaults() {
        let trip = TripRequest::parse(" , London,  ");
        assert_eq!(trip, TripRequest {
            destination: "Tokyo".into(),
            departure: "London".into(),
            language: "English".into(),
        });
        assert_eq!(TripRequest::default().destination, "Tokyo");
    }

    #[test]
    fn test_extra_fields_ignored() {
        let trip = TripRequest::parse("Lima, Quito, Spanish, extra");
        assert_eq!(trip.language, "Spanish");
    }

    #[test]
    fn test_english_in_any_case_skips_translation() {
        for language in ["English", "english", "ENGLISH", "eNgLiSh"] {
            let trip = TripRequest::parse(&format!("Oslo, Paris, {language}"));
            assert!(!trip.needs_translation(), "{language}");
        }
        assert!(TripRequest::parse("Oslo, Paris, french").needs_translation());
    }

    #[test]
    fn test_queries() {
        let trip = TripRequest::parse("Kyoto, Lyon, French");
        assert_eq!(trip.activities_query(), "best things to do and top attractions in Kyoto");
        assert_eq!(trip.weather_query(), "What is the weather in Kyoto?");
        assert_eq!(trip.translation_query("Day plan"), "Translate to French:\n\nDay plan");
        assert_eq!(trip.title(), "Travel Plan: Lyon to Kyoto");
    }

    #[test]
    fn test_brief_prompt_carries_context() {
        let brief = ItineraryBrief {
            departure: "Lyon",
            destination: "Kyoto",
            activities: "temples",
            weather: "sunny",
            budget: "$1225",
        };
        let prompt = brief.prompt();
        assert!(prompt.starts_with("Create a 1-day travel itinerary from Lyon to Kyoto"));
        assert!(prompt.contains("- Activities: temples\n- Weather: sunny\n- Budget: $1225"));
    }
}

//! Location detection from the system time zone.
//!
//! sunfollow has no location settings, so it takes the host's configured IANA
//! time zone and maps it to the coordinates of the zone's representative city.
//! That is accurate to within a few minutes of sunrise/sunset for most of a zone,
//! which is plenty for a once-a-minute light/dark switch.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::fs;
use std::path::Path;

use crate::common::constants::*;

/// Representative city for a time zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityInfo {
    pub name: &'static str,
    pub country: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

/// Resolved host location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub city: CityInfo,
    pub timezone: Tz,
}

impl Location {
    pub fn latitude(&self) -> f64 {
        self.city.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.city.longitude
    }
}

/// Determine the location of this host from its time zone.
pub fn detect_location() -> Result<Location> {
    let timezone = get_system_timezone()?;
    location_for_timezone(timezone)
}

/// Look up the location for a time zone.
pub fn location_for_timezone(timezone: Tz) -> Result<Location> {
    let city = get_city_from_timezone(timezone.name()).with_context(|| {
        format!("No known location for time zone {}", timezone.name())
    })?;
    Ok(Location { city, timezone })
}

/// Read the system time zone from `/etc/localtime`, falling back to `/etc/timezone`.
pub fn get_system_timezone() -> Result<Tz> {
    let from_link = fs::read_link(LOCALTIME_PATH)
        .ok()
        .and_then(|target| timezone_name_from_path(&target));

    let name = match from_link {
        Some(name) => name,
        None => fs::read_to_string(TIMEZONE_FILE_PATH)
            .with_context(|| {
                format!("Unable to determine the system time zone from {LOCALTIME_PATH} or {TIMEZONE_FILE_PATH}")
            })?
            .trim()
            .to_string(),
    };

    parse_timezone(&name)
}

/// Parse an IANA zone name.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("Unknown time zone '{name}': {e}"))
}

/// Extract the zone name from a zoneinfo path such as
/// `/usr/share/zoneinfo/Europe/Berlin` or `../usr/share/zoneinfo/posix/Asia/Tokyo`.
pub fn timezone_name_from_path(path: &Path) -> Option<String> {
    let path = path.to_string_lossy();
    let (_, name) = path.rsplit_once(ZONEINFO_MARKER)?;
    let name = name
        .strip_prefix("posix/")
        .or_else(|| name.strip_prefix("right/"))
        .unwrap_or(name);

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

macro_rules! city {
    ($name:literal, $country:literal, $lat:expr, $lon:expr) => {
        CityInfo {
            name: $name,
            country: $country,
            latitude: $lat,
            longitude: $lon,
        }
    };
}

/// Map a time zone name to its representative city.
///
/// Zones without a fixed geography (`UTC`, `Etc/*`) have no entry.
pub fn get_city_from_timezone(timezone: &str) -> Option<CityInfo> {
    let city = match timezone {
        // North America
        "America/New_York" | "US/Eastern" | "EST5EDT" => {
            city!("New York", "United States", 40.7128, -74.0060)
        }
        "America/Detroit" => city!("Detroit", "United States", 42.3314, -83.0458),
        "America/Indiana/Indianapolis" => {
            city!("Indianapolis", "United States", 39.7684, -86.1581)
        }
        "America/Chicago" | "US/Central" | "CST6CDT" => {
            city!("Chicago", "United States", 41.8781, -87.6298)
        }
        "America/Denver" | "US/Mountain" | "MST7MDT" => {
            city!("Denver", "United States", 39.7392, -104.9903)
        }
        "America/Phoenix" | "US/Arizona" => city!("Phoenix", "United States", 33.4484, -112.0740),
        "America/Los_Angeles" | "US/Pacific" | "PST8PDT" => {
            city!("Los Angeles", "United States", 34.0522, -118.2437)
        }
        "America/Anchorage" | "US/Alaska" => {
            city!("Anchorage", "United States", 61.2181, -149.9003)
        }
        "Pacific/Honolulu" | "US/Hawaii" => city!("Honolulu", "United States", 21.3069, -157.8583),
        "America/Toronto" | "Canada/Eastern" => city!("Toronto", "Canada", 43.6532, -79.3832),
        "America/Montreal" => city!("Montreal", "Canada", 45.5017, -73.5673),
        "America/Winnipeg" | "Canada/Central" => city!("Winnipeg", "Canada", 49.8951, -97.1384),
        "America/Edmonton" | "Canada/Mountain" => city!("Edmonton", "Canada", 53.5461, -113.4938),
        "America/Vancouver" | "Canada/Pacific" => {
            city!("Vancouver", "Canada", 49.2827, -123.1207)
        }
        "America/Halifax" | "Canada/Atlantic" => city!("Halifax", "Canada", 44.6488, -63.5752),
        "America/St_Johns" | "Canada/Newfoundland" => {
            city!("St. John's", "Canada", 47.5615, -52.7126)
        }
        "America/Mexico_City" => city!("Mexico City", "Mexico", 19.4326, -99.1332),
        "America/Monterrey" => city!("Monterrey", "Mexico", 25.6866, -100.3161),
        "America/Tijuana" => city!("Tijuana", "Mexico", 32.5149, -117.0382),
        "America/Guatemala" => city!("Guatemala City", "Guatemala", 14.6349, -90.5069),
        "America/Costa_Rica" => city!("San José", "Costa Rica", 9.9281, -84.0907),
        "America/Panama" => city!("Panama City", "Panama", 8.9824, -79.5199),
        "America/Havana" => city!("Havana", "Cuba", 23.1136, -82.3666),
        "America/Puerto_Rico" => city!("San Juan", "Puerto Rico", 18.4655, -66.1057),

        // South America
        "America/Bogota" => city!("Bogotá", "Colombia", 4.7110, -74.0721),
        "America/Caracas" => city!("Caracas", "Venezuela", 10.4806, -66.9036),
        "America/Lima" => city!("Lima", "Peru", -12.0464, -77.0428),
        "America/Guayaquil" => city!("Guayaquil", "Ecuador", -2.1710, -79.9224),
        "America/La_Paz" => city!("La Paz", "Bolivia", -16.4897, -68.1193),
        "America/Santiago" => city!("Santiago", "Chile", -33.4489, -70.6693),
        "America/Argentina/Buenos_Aires" | "America/Buenos_Aires" => {
            city!("Buenos Aires", "Argentina", -34.6037, -58.3816)
        }
        "America/Montevideo" => city!("Montevideo", "Uruguay", -34.9011, -56.1645),
        "America/Asuncion" => city!("Asunción", "Paraguay", -25.2637, -57.5759),
        "America/Sao_Paulo" | "Brazil/East" => city!("São Paulo", "Brazil", -23.5505, -46.6333),
        "America/Manaus" => city!("Manaus", "Brazil", -3.1190, -60.0217),
        "America/Recife" => city!("Recife", "Brazil", -8.0476, -34.8770),

        // Europe
        "Europe/London" | "GB" => city!("London", "United Kingdom", 51.5074, -0.1278),
        "Europe/Dublin" | "Eire" => city!("Dublin", "Ireland", 53.3498, -6.2603),
        "Europe/Lisbon" | "Portugal" => city!("Lisbon", "Portugal", 38.7223, -9.1393),
        "Europe/Madrid" => city!("Madrid", "Spain", 40.4168, -3.7038),
        "Europe/Paris" => city!("Paris", "France", 48.8566, 2.3522),
        "Europe/Brussels" => city!("Brussels", "Belgium", 50.8503, 4.3517),
        "Europe/Amsterdam" => city!("Amsterdam", "Netherlands", 52.3676, 4.9041),
        "Europe/Luxembourg" => city!("Luxembourg", "Luxembourg", 49.6116, 6.1319),
        "Europe/Berlin" => city!("Berlin", "Germany", 52.5200, 13.4050),
        "Europe/Zurich" => city!("Zurich", "Switzerland", 47.3769, 8.5417),
        "Europe/Vienna" => city!("Vienna", "Austria", 48.2082, 16.3738),
        "Europe/Rome" => city!("Rome", "Italy", 41.9028, 12.4964),
        "Europe/Copenhagen" => city!("Copenhagen", "Denmark", 55.6761, 12.5683),
        "Europe/Oslo" => city!("Oslo", "Norway", 59.9139, 10.7522),
        "Europe/Stockholm" => city!("Stockholm", "Sweden", 59.3293, 18.0686),
        "Europe/Helsinki" => city!("Helsinki", "Finland", 60.1699, 24.9384),
        "Europe/Tallinn" => city!("Tallinn", "Estonia", 59.4370, 24.7536),
        "Europe/Riga" => city!("Riga", "Latvia", 56.9496, 24.1052),
        "Europe/Vilnius" => city!("Vilnius", "Lithuania", 54.6872, 25.2797),
        "Europe/Warsaw" | "Poland" => city!("Warsaw", "Poland", 52.2297, 21.0122),
        "Europe/Prague" => city!("Prague", "Czechia", 50.0755, 14.4378),
        "Europe/Bratislava" => city!("Bratislava", "Slovakia", 48.1486, 17.1077),
        "Europe/Budapest" => city!("Budapest", "Hungary", 47.4979, 19.0402),
        "Europe/Ljubljana" => city!("Ljubljana", "Slovenia", 46.0569, 14.5058),
        "Europe/Zagreb" => city!("Zagreb", "Croatia", 45.8150, 15.9819),
        "Europe/Belgrade" => city!("Belgrade", "Serbia", 44.7866, 20.4489),
        "Europe/Bucharest" => city!("Bucharest", "Romania", 44.4268, 26.1025),
        "Europe/Sofia" => city!("Sofia", "Bulgaria", 42.6977, 23.3219),
        "Europe/Athens" => city!("Athens", "Greece", 37.9838, 23.7275),
        "Europe/Istanbul" | "Turkey" => city!("Istanbul", "Turkey", 41.0082, 28.9784),
        "Europe/Kiev" | "Europe/Kyiv" => city!("Kyiv", "Ukraine", 50.4501, 30.5234),
        "Europe/Minsk" => city!("Minsk", "Belarus", 53.9006, 27.5590),
        "Europe/Moscow" | "W-SU" => city!("Moscow", "Russia", 55.7558, 37.6173),
        "Atlantic/Reykjavik" | "Iceland" => city!("Reykjavík", "Iceland", 64.1466, -21.9426),

        // Africa
        "Africa/Cairo" | "Egypt" => city!("Cairo", "Egypt", 30.0444, 31.2357),
        "Africa/Casablanca" => city!("Casablanca", "Morocco", 33.5731, -7.5898),
        "Africa/Algiers" => city!("Algiers", "Algeria", 36.7538, 3.0588),
        "Africa/Tunis" => city!("Tunis", "Tunisia", 36.8065, 10.1815),
        "Africa/Lagos" => city!("Lagos", "Nigeria", 6.5244, 3.3792),
        "Africa/Accra" => city!("Accra", "Ghana", 5.6037, -0.1870),
        "Africa/Dakar" => city!("Dakar", "Senegal", 14.7167, -17.4677),
        "Africa/Nairobi" => city!("Nairobi", "Kenya", -1.2921, 36.8219),
        "Africa/Addis_Ababa" => city!("Addis Ababa", "Ethiopia", 9.0320, 38.7469),
        "Africa/Kinshasa" => city!("Kinshasa", "DR Congo", -4.4419, 15.2663),
        "Africa/Johannesburg" => city!("Johannesburg", "South Africa", -26.2041, 28.0473),

        // Middle East and Asia
        "Asia/Jerusalem" | "Asia/Tel_Aviv" | "Israel" => {
            city!("Jerusalem", "Israel", 31.7683, 35.2137)
        }
        "Asia/Beirut" => city!("Beirut", "Lebanon", 33.8938, 35.5018),
        "Asia/Amman" => city!("Amman", "Jordan", 31.9454, 35.9284),
        "Asia/Baghdad" => city!("Baghdad", "Iraq", 33.3152, 44.3661),
        "Asia/Riyadh" => city!("Riyadh", "Saudi Arabia", 24.7136, 46.6753),
        "Asia/Qatar" => city!("Doha", "Qatar", 25.2854, 51.5310),
        "Asia/Dubai" => city!("Dubai", "United Arab Emirates", 25.2048, 55.2708),
        "Asia/Tehran" | "Iran" => city!("Tehran", "Iran", 35.6892, 51.3890),
        "Asia/Tbilisi" => city!("Tbilisi", "Georgia", 41.7151, 44.8271),
        "Asia/Yerevan" => city!("Yerevan", "Armenia", 40.1792, 44.4991),
        "Asia/Baku" => city!("Baku", "Azerbaijan", 40.4093, 49.8671),
        "Asia/Tashkent" => city!("Tashkent", "Uzbekistan", 41.2995, 69.2401),
        "Asia/Almaty" => city!("Almaty", "Kazakhstan", 43.2220, 76.8512),
        "Asia/Karachi" => city!("Karachi", "Pakistan", 24.8607, 67.0011),
        "Asia/Kabul" => city!("Kabul", "Afghanistan", 34.5553, 69.2075),
        "Asia/Kolkata" | "Asia/Calcutta" => city!("Kolkata", "India", 22.5726, 88.3639),
        "Asia/Kathmandu" => city!("Kathmandu", "Nepal", 27.7172, 85.3240),
        "Asia/Colombo" => city!("Colombo", "Sri Lanka", 6.9271, 79.8612),
        "Asia/Dhaka" => city!("Dhaka", "Bangladesh", 23.8103, 90.4125),
        "Asia/Yangon" => city!("Yangon", "Myanmar", 16.8409, 96.1735),
        "Asia/Bangkok" => city!("Bangkok", "Thailand", 13.7563, 100.5018),
        "Asia/Ho_Chi_Minh" | "Asia/Saigon" => {
            city!("Ho Chi Minh City", "Vietnam", 10.8231, 106.6297)
        }
        "Asia/Jakarta" => city!("Jakarta", "Indonesia", -6.2088, 106.8456),
        "Asia/Kuala_Lumpur" => city!("Kuala Lumpur", "Malaysia", 3.1390, 101.6869),
        "Asia/Singapore" | "Singapore" => city!("Singapore", "Singapore", 1.3521, 103.8198),
        "Asia/Manila" => city!("Manila", "Philippines", 14.5995, 120.9842),
        "Asia/Shanghai" | "Asia/Chongqing" | "PRC" => {
            city!("Shanghai", "China", 31.2304, 121.4737)
        }
        "Asia/Hong_Kong" | "Hongkong" => city!("Hong Kong", "China", 22.3193, 114.1694),
        "Asia/Taipei" | "ROC" => city!("Taipei", "Taiwan", 25.0330, 121.5654),
        "Asia/Seoul" | "ROK" => city!("Seoul", "South Korea", 37.5665, 126.9780),
        "Asia/Tokyo" | "Japan" => city!("Tokyo", "Japan", 35.6762, 139.6503),
        "Asia/Ulaanbaatar" => city!("Ulaanbaatar", "Mongolia", 47.8864, 106.9057),
        "Asia/Novosibirsk" => city!("Novosibirsk", "Russia", 55.0084, 82.9357),
        "Asia/Yekaterinburg" => city!("Yekaterinburg", "Russia", 56.8389, 60.6057),
        "Asia/Vladivostok" => city!("Vladivostok", "Russia", 43.1155, 131.8855),

        // Oceania
        "Australia/Sydney" | "Australia/NSW" => {
            city!("Sydney", "Australia", -33.8688, 151.2093)
        }
        "Australia/Melbourne" | "Australia/Victoria" => {
            city!("Melbourne", "Australia", -37.8136, 144.9631)
        }
        "Australia/Brisbane" | "Australia/Queensland" => {
            city!("Brisbane", "Australia", -27.4698, 153.0251)
        }
        "Australia/Adelaide" | "Australia/South" => {
            city!("Adelaide", "Australia", -34.9285, 138.6007)
        }
        "Australia/Darwin" | "Australia/North" => {
            city!("Darwin", "Australia", -12.4634, 130.8456)
        }
        "Australia/Perth" | "Australia/West" => city!("Perth", "Australia", -31.9505, 115.8605),
        "Australia/Hobart" | "Australia/Tasmania" => {
            city!("Hobart", "Australia", -42.8821, 147.3272)
        }
        "Pacific/Auckland" | "NZ" => city!("Auckland", "New Zealand", -36.8485, 174.7633),
        "Pacific/Fiji" => city!("Suva", "Fiji", -18.1248, 178.4501),
        "Pacific/Guam" => city!("Hagåtña", "Guam", 13.4443, 144.7937),
        _ => return None,
    };
    Some(city)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_name_from_usual_link() {
        assert_eq!(
            timezone_name_from_path(Path::new("/usr/share/zoneinfo/Europe/Berlin")),
            Some("Europe/Berlin".to_string())
        );
        assert_eq!(
            timezone_name_from_path(Path::new("../usr/share/zoneinfo/America/Argentina/Buenos_Aires")),
            Some("America/Argentina/Buenos_Aires".to_string())
        );
    }

    #[test]
    fn test_zone_name_strips_posix_and_right() {
        assert_eq!(
            timezone_name_from_path(Path::new("/usr/share/zoneinfo/posix/Asia/Tokyo")),
            Some("Asia/Tokyo".to_string())
        );
        assert_eq!(
            timezone_name_from_path(Path::new("/usr/share/zoneinfo/right/UTC")),
            Some("UTC".to_string())
        );
    }

    #[test]
    fn test_zone_name_rejects_unrelated_paths() {
        assert_eq!(timezone_name_from_path(Path::new("/etc/some/file")), None);
        assert_eq!(timezone_name_from_path(Path::new("/usr/share/zoneinfo/")), None);
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Europe/London").unwrap(), Tz::Europe__London);
        assert!(parse_timezone("Invalid/Unknown_Timezone").is_err());
    }

    #[test]
    fn test_unknown_timezone_has_no_city() {
        assert!(get_city_from_timezone("Invalid/Unknown_Timezone").is_none());
        assert!(get_city_from_timezone("UTC").is_none());
        assert!(get_city_from_timezone("Etc/GMT+5").is_none());
    }

    #[test]
    fn test_city_lookup_for_major_zones() {
        let london = get_city_from_timezone("Europe/London").unwrap();
        assert!((london.latitude - 51.5074).abs() < 0.1);
        assert!((london.longitude - (-0.1278)).abs() < 0.1);

        let tokyo = get_city_from_timezone("Asia/Tokyo").unwrap();
        assert_eq!(tokyo.name, "Tokyo");
        assert_eq!(tokyo.country, "Japan");
    }

    #[test]
    fn test_aliases_share_city() {
        assert_eq!(
            get_city_from_timezone("US/Pacific"),
            get_city_from_timezone("America/Los_Angeles")
        );
        assert_eq!(
            get_city_from_timezone("Asia/Calcutta"),
            get_city_from_timezone("Asia/Kolkata")
        );
    }

    #[test]
    fn test_city_table_entries_are_valid() {
        // Every zone chrono-tz knows either has a plausible city or none at all
        for tz in chrono_tz::TZ_VARIANTS {
            if let Some(city) = get_city_from_timezone(tz.name()) {
                assert!(!city.name.is_empty(), "Empty name for {}", tz.name());
                assert!(!city.country.is_empty(), "Empty country for {}", tz.name());
                assert!((-90.0..=90.0).contains(&city.latitude), "{}", tz.name());
                assert!((-180.0..=180.0).contains(&city.longitude), "{}", tz.name());
            }
        }
    }

    #[test]
    fn test_location_for_timezone() {
        let location = location_for_timezone(Tz::America__Chicago).unwrap();
        assert_eq!(location.city.name, "Chicago");
        assert_eq!(location.timezone, Tz::America__Chicago);

        let err = location_for_timezone(Tz::UTC).unwrap_err();
        assert!(err.to_string().contains("No known location for time zone UTC"));
    }
}

/*!
Computes the times of dawn, sunrise, solar transit, sunset and dusk for a
calendar date at a location on Earth.

The model is a low order one: the sun's position comes from a two body
orbit with an equation of center correction, and the rise and set times are
interpolated between the sun's positions at the start of the given day and
the next. It is accurate to within a minute or so at moderate latitudes,
which is plenty for scheduling.

Near the poles, the sun may never cross the altitude that defines an event
on a given day. That is not an error. The event is simply absent.
*/

use jiff::{
    SignedDuration,
    civil::{Date, DateTime},
};

use crate::calendar::days_since_epoch;

const DEG: f64 = std::f64::consts::PI / 180.0;
const RAD: f64 = 180.0 / std::f64::consts::PI;
const TAU: f64 = std::f64::consts::TAU;

/// The Julian day of 1970-01-01T00:00:00Z.
const UNIX_EPOCH_JULIAN_DAY: f64 = 2440587.5;
/// The Julian day of the J2000 epoch.
const J2000: f64 = 2451545.0;

/// The location and corrections needed to compute solar events.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolarParams {
    /// Degrees north of the equator. Southern latitudes are negative.
    pub latitude: f64,
    /// Degrees east of Greenwich. Western longitudes are negative.
    pub longitude: f64,
    /// The offset, in hours, of the wall clock that events are reported in.
    #[serde(default)]
    pub zone_offset: f64,
    /// The difference, in seconds, between terrestrial time and universal
    /// time.
    #[serde(default)]
    pub delta_t: f64,
    /// The altitude of the sun, in degrees, at dawn and dusk.
    #[serde(default = "default_twilight_angle")]
    pub twilight_angle: f64,
}

fn default_twilight_angle() -> f64 {
    -6.0
}

impl SolarParams {
    /// Create parameters for the given location, reporting events in UTC
    /// with civil twilight.
    pub fn new(latitude: f64, longitude: f64) -> SolarParams {
        SolarParams {
            latitude,
            longitude,
            zone_offset: 0.0,
            delta_t: 0.0,
            twilight_angle: default_twilight_angle(),
        }
    }

    /// Report events on a wall clock that is `hours` ahead of UTC.
    pub fn zone_offset(self, hours: f64) -> SolarParams {
        SolarParams { zone_offset: hours, ..self }
    }

    /// Set the sun's altitude, in degrees, that defines dawn and dusk.
    pub fn twilight_angle(self, degrees: f64) -> SolarParams {
        SolarParams { twilight_angle: degrees, ..self }
    }

    /// Set the difference, in seconds, between terrestrial time and
    /// universal time.
    pub fn delta_t(self, seconds: f64) -> SolarParams {
        SolarParams { delta_t: seconds, ..self }
    }

    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        fn check(name: &str, value: f64, limit: f64) -> anyhow::Result<()> {
            anyhow::ensure!(
                value.is_finite() && -limit <= value && value <= limit,
                "invalid solar '{name}' value `{value}` \
                 (values must be in range -{limit}..={limit})",
            );
            Ok(())
        }
        check("latitude", self.latitude, 90.0)?;
        check("longitude", self.longitude, 180.0)?;
        check("zone_offset", self.zone_offset, 24.0)?;
        check("twilight_angle", self.twilight_angle, 90.0)?;
        anyhow::ensure!(
            self.delta_t.is_finite(),
            "invalid solar 'delta_t' value `{}` (value must be finite)",
            self.delta_t,
        );
        Ok(())
    }
}

/// The solar events of one day, as wall clock datetimes.
///
/// Events are reported on the wall clock given by
/// [`SolarParams::zone_offset`]. When the wall clock runs far enough from
/// local solar time, an event may fall on the next calendar day. Sunset,
/// transit and dusk are never reported before sunrise and dawn.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SolarEvents {
    pub dawn: Option<DateTime>,
    pub sunrise: Option<DateTime>,
    pub transit: Option<DateTime>,
    pub sunset: Option<DateTime>,
    pub dusk: Option<DateTime>,
}

/// Compute the solar events for the given date.
pub fn events(date: Date, params: &SolarParams) -> SolarEvents {
    let jd0 = UNIX_EPOCH_JULIAN_DAY + days_since_epoch(date) as f64;
    let lat = params.latitude * DEG;
    let lon = params.longitude * DEG;
    let tt = params.delta_t / 86_400.0;
    let today = Position::at(jd0 + tt);
    let tomorrow = Position::at(jd0 + 1.0 + tt);
    let day = SiderealDay::new(jd0, lon);

    let transit = day.event(today.transit(lon), tomorrow.transit(lon), 0.0);
    let mut rise = None;
    let mut set = None;
    if let (Some(h1), Some(h2)) =
        (today.hour_angle(lat, 0.0), tomorrow.hour_angle(lat, 0.0))
    {
        // Refraction and the sun's disc make it appear above the horizon
        // slightly before its center geometrically reaches it.
        let altitude =
            0.5 * today.diameter - today.parallax + 34.0 / 60.0 * DEG;
        let correction = horizon_correction(&today, &tomorrow, lat, altitude);
        rise = Some(day.event(
            today.rise(lon, h1),
            tomorrow.rise(lon, h2),
            -correction,
        ));
        set = Some(day.event(
            today.set(lon, h1),
            tomorrow.set(lon, h2),
            correction,
        ));
    }
    let mut dawn = None;
    let mut dusk = None;
    let twilight = params.twilight_angle * DEG;
    if let (Some(h1), Some(h2)) =
        (today.hour_angle(lat, twilight), tomorrow.hour_angle(lat, twilight))
    {
        dawn =
            Some(day.event(today.rise(lon, h1), tomorrow.rise(lon, h2), 0.0));
        dusk =
            Some(day.event(today.set(lon, h1), tomorrow.set(lon, h2), 0.0));
    }

    let local = |hours: Option<f64>| {
        hours
            .filter(|h| h.is_finite())
            .map(|h| (h + params.zone_offset).rem_euclid(24.0))
    };
    let (dawn, rise) = (local(dawn), local(rise));
    let mut transit = local(Some(transit));
    let (mut set, mut dusk) = (local(set), local(dusk));
    if let Some(rise) = rise {
        unwrap_after(&mut set, rise);
        unwrap_after(&mut transit, rise);
    }
    if let Some(dawn) = dawn {
        unwrap_after(&mut dusk, dawn);
    }
    let at = |hours: Option<f64>| hours.and_then(|h| wall_clock(date, h));
    SolarEvents {
        dawn: at(dawn),
        sunrise: at(rise),
        transit: at(transit),
        sunset: at(set),
        dusk: at(dusk),
    }
}

/// Move `hours` one day later when it falls before `earliest`.
fn unwrap_after(hours: &mut Option<f64>, earliest: f64) {
    if let Some(ref mut h) = *hours {
        if *h < earliest {
            *h += 24.0;
        }
    }
}

/// Returns the wall clock datetime `hours` after the start of `date`,
/// rounded to the nearest millisecond.
fn wall_clock(date: Date, hours: f64) -> Option<DateTime> {
    let millis = (hours * 3_600_000.0).round();
    if !millis.is_finite() {
        return None;
    }
    let span = SignedDuration::from_millis(millis as i64);
    date.to_datetime(jiff::civil::Time::midnight()).checked_add(span).ok()
}

/// The equatorial position of the sun at an instant.
#[derive(Clone, Copy, Debug)]
struct Position {
    /// Right ascension in radians.
    right_ascension: f64,
    /// Declination in radians.
    declination: f64,
    /// Angular diameter in radians.
    diameter: f64,
    /// Horizontal parallax in radians.
    parallax: f64,
}

impl Position {
    /// Compute the sun's position at the given Julian day in terrestrial
    /// time.
    fn at(jd: f64) -> Position {
        // Orbital elements at the 1990.0 epoch.
        let d = jd - 2447891.5;
        let ecliptic_longitude_at_epoch = 279.403303 * DEG;
        let perigee_longitude = 282.768422 * DEG;
        let eccentricity = 0.016713;
        let semi_major_axis_km = 149598500.0;
        let diameter_at_1au = 0.533128 * DEG;

        let mean_anomaly = TAU / 365.242191 * d + ecliptic_longitude_at_epoch
            - perigee_longitude;
        let true_anomaly =
            mean_anomaly + 2.0 * eccentricity * mean_anomaly.sin();
        let longitude = (true_anomaly + perigee_longitude).rem_euclid(TAU);
        let latitude: f64 = 0.0;
        let distance = (1.0 - eccentricity * eccentricity)
            / (1.0 + eccentricity * true_anomaly.cos());
        let diameter = diameter_at_1au / distance;
        let parallax = 6378.137 / (distance * semi_major_axis_km);

        let obliquity = obliquity(jd);
        let right_ascension = (longitude.sin() * obliquity.cos()
            - latitude.tan() * obliquity.sin())
        .atan2(longitude.cos())
        .rem_euclid(TAU);
        let declination = (latitude.sin() * obliquity.cos()
            + latitude.cos() * obliquity.sin() * longitude.sin())
        .asin();
        Position { right_ascension, declination, diameter, parallax }
    }

    /// Returns the hour angle, in radians, at which the sun reaches the
    /// given altitude. When it never does on this day, `None` is returned.
    fn hour_angle(&self, lat: f64, altitude: f64) -> Option<f64> {
        let x = (altitude.sin() - lat.sin() * self.declination.sin())
            / (lat.cos() * self.declination.cos());
        if !(-1.0..=1.0).contains(&x) {
            return None;
        }
        Some(x.acos())
    }

    /// Returns the sidereal time, in hours, of transit.
    fn transit(&self, lon: f64) -> f64 {
        sidereal_hours(self.right_ascension - lon)
    }

    /// Returns the sidereal time, in hours, of crossing the altitude with
    /// the given hour angle while rising.
    fn rise(&self, lon: f64, hour_angle: f64) -> f64 {
        sidereal_hours(-hour_angle + self.right_ascension - lon)
    }

    /// Returns the sidereal time, in hours, of crossing the altitude with
    /// the given hour angle while setting.
    fn set(&self, lon: f64, hour_angle: f64) -> f64 {
        sidereal_hours(hour_angle + self.right_ascension - lon)
    }
}

/// Returns the obliquity of the ecliptic, in radians, at the given Julian
/// day.
fn obliquity(jd: f64) -> f64 {
    let t = (jd - J2000) / 36525.0;
    let arcseconds = t * (-46.815 + t * (-0.0006 + t * 0.00181));
    (23.0 + (26.0 + 21.45 / 60.0) / 60.0 + arcseconds / 3600.0) * DEG
}

/// Convert an angle in radians to sidereal hours in `[0, 24)`.
fn sidereal_hours(radians: f64) -> f64 {
    (RAD / 15.0 * radians).rem_euclid(24.0)
}

/// The sidereal time at the start of a day at a longitude.
#[derive(Clone, Copy, Debug)]
struct SiderealDay {
    /// Greenwich mean sidereal time at 00:00 UTC, in hours.
    gmst0: f64,
    /// Local sidereal time at 00:00 UTC, in hours.
    local: f64,
}

impl SiderealDay {
    fn new(jd0: f64, lon: f64) -> SiderealDay {
        let t = (jd0 - J2000) / 36525.0;
        let gmst0 = (6.697374558 + t * (2400.051336 + t * 0.000025862))
            .rem_euclid(24.0);
        let mut local = gmst0 - lon * RAD / 15.0 * 1.002738;
        if local < 0.0 {
            local += 24.0;
        }
        SiderealDay { gmst0, local }
    }

    /// Interpolate between the sidereal times of an event computed for this
    /// day and the next, and convert the result to hours of universal time
    /// after 00:00 UTC.
    fn event(
        &self,
        mut today: f64,
        mut tomorrow: f64,
        correction: f64,
    ) -> f64 {
        if today > tomorrow && (today - tomorrow).abs() > 18.0 {
            tomorrow += 24.0;
        }
        if today < self.local {
            today += 24.0;
            tomorrow += 24.0;
        }
        let tf = 24.07;
        let sidereal = (tf * today - self.gmst0 * (tomorrow - today))
            / (tf + today - tomorrow);
        0.9972695663 * (sidereal + correction - self.gmst0)
    }
}

/// Returns the time, in hours, it takes the sun to climb from the horizon
/// to the given apparent altitude at this latitude.
fn horizon_correction(
    today: &Position,
    tomorrow: &Position,
    lat: f64,
    altitude: f64,
) -> f64 {
    let declination = 0.5 * (today.declination + tomorrow.declination);
    let psi = (lat.sin() / declination.cos()).acos();
    let y = (altitude.sin() / psi.sin()).asin();
    240.0 * RAD * y / declination.cos() / 3600.0
}

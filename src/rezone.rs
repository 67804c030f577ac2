use {
    anyhow::Context,
    jiff::{Timestamp, tz::Offset, tz::TimeZone},
};

/// Converts a floating occurrence into a real instant in a time zone.
///
/// Rules are evaluated on floating wall clock fields, encoded as the UTC
/// fields of a `Timestamp`. When a rule has a `tzid`, every occurrence it
/// produces is passed through a `Rezone` along with that `tzid` to turn
/// it into the instant at which that wall clock reading happens in the zone.
///
/// This is implemented for closures, which makes it easy to inject a custom
/// time zone database.
pub trait Rezone: Send + Sync {
    fn rezone(&self, floating: Timestamp, tzid: &str) -> Timestamp;
}

impl<F> Rezone for F
where
    F: Fn(Timestamp, &str) -> Timestamp + Send + Sync,
{
    fn rezone(&self, floating: Timestamp, tzid: &str) -> Timestamp {
        self(floating, tzid)
    }
}

/// Rezones occurrences using Jiff's bundled time zone database.
///
/// Wall clock readings that fall in a gap or a fold are resolved with the
/// "compatible" strategy: a reading in a gap is moved forward by the length
/// of the gap and a reading in a fold picks the earlier instant.
#[derive(Clone, Debug)]
pub struct ZoneRezone {
    name: String,
    tz: TimeZone,
}

impl ZoneRezone {
    /// Look up the named time zone.
    pub fn new(tzid: &str) -> anyhow::Result<ZoneRezone> {
        let tz = TimeZone::get(tzid)
            .with_context(|| format!("invalid 'tzid' value `{tzid}`"))?;
        Ok(ZoneRezone { name: tzid.to_string(), tz })
    }
}

impl Rezone for ZoneRezone {
    fn rezone(&self, floating: Timestamp, tzid: &str) -> Timestamp {
        let result = if tzid == self.name {
            to_zone(&self.tz, floating)
        } else {
            TimeZone::get(tzid)
                .map_err(anyhow::Error::from)
                .and_then(|tz| to_zone(&tz, floating))
        };
        match result {
            Ok(ts) => ts,
            Err(err) => {
                log::warn!(
                    "failed to rezone {floating} into `{tzid}`, \
                     keeping floating value: {err:#}",
                );
                floating
            }
        }
    }
}

fn to_zone(tz: &TimeZone, floating: Timestamp) -> anyhow::Result<Timestamp> {
    let dt = Offset::UTC.to_datetime(floating);
    Ok(tz.to_ambiguous_timestamp(dt).compatible()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rezone(tzid: &str, floating: &str) -> String {
        let rezoner = ZoneRezone::new(tzid).unwrap();
        rezoner.rezone(floating.parse().unwrap(), tzid).to_string()
    }

    #[test]
    fn wall_clock_is_kept() {
        insta::assert_snapshot!(
            rezone("America/New_York", "2024-07-01T09:00:00Z"),
            @"2024-07-01T13:00:00Z",
        );
        insta::assert_snapshot!(
            rezone("America/New_York", "2024-01-01T09:00:00Z"),
            @"2024-01-01T14:00:00Z",
        );
        insta::assert_snapshot!(
            rezone("Asia/Kolkata", "2024-01-01T09:00:00Z"),
            @"2024-01-01T03:30:00Z",
        );
    }

    #[test]
    fn gaps_and_folds_are_compatible() {
        // 02:30 does not exist on 2024-03-10 in New York, so it is moved
        // forward to 03:30 EDT.
        insta::assert_snapshot!(
            rezone("America/New_York", "2024-03-10T02:30:00Z"),
            @"2024-03-10T07:30:00Z",
        );
        // 01:30 happens twice on 2024-11-03 in New York. The earlier one is
        // in EDT.
        insta::assert_snapshot!(
            rezone("America/New_York", "2024-11-03T01:30:00Z"),
            @"2024-11-03T05:30:00Z",
        );
    }

    #[test]
    fn unknown_zone() {
        let err = ZoneRezone::new("Mars/Olympus_Mons").unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"invalid 'tzid' value `Mars/Olympus_Mons`",
        );
        // An unknown zone at rezone time keeps the floating value.
        let rezoner = ZoneRezone::new("UTC").unwrap();
        let floating: Timestamp = "2024-01-01T09:00:00Z".parse().unwrap();
        assert_eq!(rezoner.rezone(floating, "Mars/Olympus_Mons"), floating);
    }

    #[test]
    fn closures_rezone() {
        let shift = |ts: Timestamp, _: &str| {
            ts.checked_add(jiff::SignedDuration::from_hours(1)).unwrap()
        };
        let floating: Timestamp = "2024-01-01T09:00:00Z".parse().unwrap();
        insta::assert_snapshot!(
            Rezone::rezone(&shift, floating, "anything"),
            @"2024-01-01T10:00:00Z",
        );
    }
}

//! Geolocation matcher.
//!
//! Pure proximity filtering over in-memory candidates. Distances are
//! great-circle (haversine) on a sphere of radius [`EARTH_RADIUS_KM`].

use geo::Point;

use crate::models::blood_bank::BloodBank;
use crate::models::user::{DonorStatus, User};
use crate::models::{BloodType, GeoPoint};

/// Mean Earth radius used for every distance in the system.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, in kilometres.
///
/// Points follow the `geo` convention: `x` is longitude, `y` latitude.
pub fn haversine_km(a: Point<f64>, b: Point<f64>) -> f64 {
    let (lat1, lat2) = (a.y().to_radians(), b.y().to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b.x() - a.x()).to_radians();

    // Rounding can push h just past 1.0 for near-antipodal pairs.
    let h = ((d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2))
        .clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Something with a position that may or may not take part in searches.
pub trait Locatable {
    fn position(&self) -> Option<GeoPoint>;

    /// Whether the candidate may appear in results at all.
    fn is_eligible(&self) -> bool;
}

impl Locatable for User {
    fn position(&self) -> Option<GeoPoint> {
        self.as_donor().map(|d| d.location)
    }

    /// Active donors who are available.
    fn is_eligible(&self) -> bool {
        self.is_active
            && self
                .as_donor()
                .is_some_and(|d| d.status == DonorStatus::Available)
    }
}

impl Locatable for BloodBank {
    fn position(&self) -> Option<GeoPoint> {
        Some(self.location)
    }

    fn is_eligible(&self) -> bool {
        self.is_active
    }
}

/// A candidate annotated with its distance from the search center.
#[derive(Debug, Clone)]
pub struct WithinRadius<T> {
    pub candidate: T,
    pub distance_km: f64,
}

/// Returns eligible candidates whose distance to `center` is at most
/// `radius_km` and which pass `filter`. Order follows the input.
pub fn find_within_radius<T, F>(
    center: GeoPoint,
    radius_km: f64,
    candidates: impl IntoIterator<Item = T>,
    filter: F,
) -> Vec<WithinRadius<T>>
where
    T: Locatable,
    F: Fn(&T) -> bool,
{
    let center: Point<f64> = center.into();

    candidates
        .into_iter()
        .filter(|c| c.is_eligible() && filter(c))
        .filter_map(|c| {
            let position = c.position()?;
            let distance_km = haversine_km(center, position.into());
            (distance_km <= radius_km).then_some(WithinRadius {
                candidate: c,
                distance_km,
            })
        })
        .collect()
}

/// Donor search: eligible donors within range, restricted to an exact blood
/// type when one is given.
pub fn find_donors_within_radius(
    center: GeoPoint,
    radius_km: f64,
    donors: impl IntoIterator<Item = User>,
    blood_type: Option<BloodType>,
) -> Vec<WithinRadius<User>> {
    find_within_radius(center, radius_km, donors, |u| match blood_type {
        Some(bt) => u.blood_type() == Some(bt),
        None => true,
    })
}

/// Sorts matches nearest first.
pub fn sort_by_distance<T>(matches: &mut [WithinRadius<T>]) {
    matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
}

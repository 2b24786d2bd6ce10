/// Rotates a TEME position into the Earth-fixed frame using Greenwich mean
/// sidereal time in radians.
pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

/// Active rotation of `v` about the z axis by `angle` radians.
pub fn rotate_z(v: [f64; 3], angle: f64) -> [f64; 3] {
    let (sin_a, cos_a) = angle.sin_cos();
    [
        v[0] * cos_a - v[1] * sin_a,
        v[0] * sin_a + v[1] * cos_a,
        v[2],
    ]
}

pub fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn norm(v: [f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

/// Right ascension and declination in degrees plus range, for a vector
/// given in an equatorial frame. RA is normalised to [0, 360).
pub fn to_spherical(v: [f64; 3]) -> (f64, f64, f64) {
    let range = norm(v);
    if range == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let ra = v[1].atan2(v[0]).to_degrees().rem_euclid(360.0);
    let dec = (v[2] / range).clamp(-1.0, 1.0).asin().to_degrees();
    (ra, dec, range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rotate_z_inverts_teme_to_ecef() {
        let teme = [6_700.0, -1_200.0, 850.0];
        let gmst = 1.234;
        let back = rotate_z(teme_to_ecef_position(teme, gmst), gmst);
        for i in 0..3 {
            assert_abs_diff_eq!(back[i], teme[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_to_spherical() {
        let (ra, dec, range) = to_spherical([0.0, -2.0, 2.0]);
        assert_abs_diff_eq!(ra, 270.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dec, 45.0, epsilon = 1e-12);
        assert_abs_diff_eq!(range, 8.0_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(to_spherical([0.0; 3]), (0.0, 0.0, 0.0));
    }
}

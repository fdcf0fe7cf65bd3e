//! Pointwise Jacobi update for the Horn & Schunck iteration.
//!
//! Every output pixel depends only on the prior-iteration neighbourhood
//! means and the (fixed) gradients, so the update is embarrassingly
//! parallel. The `rayon` feature splits the work by rows and the `simd`
//! feature evaluates four pixels per lane; both paths evaluate the exact
//! scalar expression tree per pixel, so results stay bit-identical to the
//! serial reference.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// One full Jacobi commit: overwrites `u`/`v` with the updated field.
///
/// All slices are contiguous row-major buffers of the same length, a
/// multiple of `width`. `u`/`v` must not alias `ubar`/`vbar`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn jacobi_update(
    alpha2: f64,
    width: usize,
    ex: &[f64],
    ey: &[f64],
    et: &[f64],
    ubar: &[f64],
    vbar: &[f64],
    u: &mut [f64],
    v: &mut [f64],
) {
    debug_assert_eq!(u.len() % width, 0);

    #[cfg(feature = "rayon")]
    {
        u.par_chunks_mut(width)
            .zip(v.par_chunks_mut(width))
            .zip(
                ubar.par_chunks(width)
                    .zip(vbar.par_chunks(width))
                    .zip(ex.par_chunks(width))
                    .zip(ey.par_chunks(width))
                    .zip(et.par_chunks(width)),
            )
            .for_each(|((u_row, v_row), ((((ubar_row, vbar_row), ex_row), ey_row), et_row))| {
                update_row(
                    alpha2, ex_row, ey_row, et_row, ubar_row, vbar_row, u_row, v_row,
                );
            });
    }

    #[cfg(not(feature = "rayon"))]
    {
        let rows = u.len() / width;
        for r in 0..rows {
            let s = r * width;
            let e = s + width;
            update_row(
                alpha2,
                &ex[s..e],
                &ey[s..e],
                &et[s..e],
                &ubar[s..e],
                &vbar[s..e],
                &mut u[s..e],
                &mut v[s..e],
            );
        }
    }
}

#[cfg(not(feature = "simd"))]
#[allow(clippy::too_many_arguments)]
fn update_row(
    alpha2: f64,
    ex: &[f64],
    ey: &[f64],
    et: &[f64],
    ubar: &[f64],
    vbar: &[f64],
    u: &mut [f64],
    v: &mut [f64],
) {
    for x in 0..u.len() {
        let numer = ex[x] * ubar[x] + ey[x] * vbar[x] + et[x];
        let denom = alpha2 + ex[x] * ex[x] + ey[x] * ey[x] + et[x] * et[x];
        let ratio = numer / denom;
        u[x] = ubar[x] - ex[x] * ratio;
        v[x] = vbar[x] - ey[x] * ratio;
    }
}

#[cfg(feature = "simd")]
#[allow(clippy::too_many_arguments)]
fn update_row(
    alpha2: f64,
    ex: &[f64],
    ey: &[f64],
    et: &[f64],
    ubar: &[f64],
    vbar: &[f64],
    u: &mut [f64],
    v: &mut [f64],
) {
    use wide::f64x4;

    let len = u.len();
    let lanes = len - len % 4;
    let alpha2v = f64x4::splat(alpha2);

    let mut x = 0;
    while x < lanes {
        let exv = f64x4::from([ex[x], ex[x + 1], ex[x + 2], ex[x + 3]]);
        let eyv = f64x4::from([ey[x], ey[x + 1], ey[x + 2], ey[x + 3]]);
        let etv = f64x4::from([et[x], et[x + 1], et[x + 2], et[x + 3]]);
        let ubarv = f64x4::from([ubar[x], ubar[x + 1], ubar[x + 2], ubar[x + 3]]);
        let vbarv = f64x4::from([vbar[x], vbar[x + 1], vbar[x + 2], vbar[x + 3]]);

        let numer = exv * ubarv + eyv * vbarv + etv;
        let denom = alpha2v + exv * exv + eyv * eyv + etv * etv;
        let ratio = numer / denom;
        let un = (ubarv - exv * ratio).to_array();
        let vn = (vbarv - eyv * ratio).to_array();
        u[x..x + 4].copy_from_slice(&un);
        v[x..x + 4].copy_from_slice(&vn);
        x += 4;
    }

    for x in lanes..len {
        let numer = ex[x] * ubar[x] + ey[x] * vbar[x] + et[x];
        let denom = alpha2 + ex[x] * ex[x] + ey[x] * ey[x] + et[x] * et[x];
        let ratio = numer / denom;
        u[x] = ubar[x] - ex[x] * ratio;
        v[x] = vbar[x] - ey[x] * ratio;
    }
}

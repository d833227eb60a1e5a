#![cfg(test)]

use super::_tests_support::{test_image, GaussianKernel, MidpointDiscretizer, TestBackend};
use super::grid::Grid2D;
use super::operator::{pad_mask, ForwardOperator};
use super::spectral::{fft2, ifft2_real, SpectralDomain};

#[test]
fn fft_ifft_round_trip() {
    let grid = Grid2D::new(8, 8);
    let image = test_image(grid);
    let recovered = ifft2_real(&TestBackend, &fft2(&TestBackend, &image));
    for (a, b) in image.as_slice().iter().zip(recovered.as_slice()) {
        assert!((a - b).abs() < 1e-10);
    }
}

#[test]
fn separable_outer_product_ordering() {
    let grid = Grid2D::new(12, 12);
    let op = ForwardOperator::separable(grid, 2.0, false, &GaussianKernel, &MidpointDiscretizer)
        .unwrap();
    let b = test_image(grid);
    let domain = SpectralDomain::transform(&TestBackend, &op, &b, &b).unwrap();

    let (svd1, svd2) = match &op {
        ForwardOperator::Separable { svd1, svd2, .. } => (svd1, svd2),
        _ => unreachable!(),
    };
    match &domain {
        SpectralDomain::Separable { s, utb, vx } => {
            assert_eq!(utb.grid(), grid);
            assert_eq!(vx.grid(), grid);
            // S[i][j] pairs the second axis's singular values with rows.
            for i in 0..4 {
                for j in 0..4 {
                    let expected = svd2.s[i] * svd1.s[j];
                    assert!((s.get(i, j) - expected).abs() < 1e-14);
                }
            }
        }
        _ => panic!("expected separable spectral domain"),
    }
}

#[test]
fn circulant_magnitudes_are_kernel_moduli() {
    let grid = Grid2D::new(16, 16);
    let ahat =
        ForwardOperator::frequency_kernel(&TestBackend, grid, 0.5, 2.0, false, &GaussianKernel)
            .unwrap();
    let expected = ahat.magnitude();
    let op = ForwardOperator::Circulant { ahat };
    let b = test_image(grid);
    let domain = SpectralDomain::transform(&TestBackend, &op, &b, &b).unwrap();

    match &domain {
        SpectralDomain::Circulant { s, utb, .. } => {
            assert_eq!(s, &expected);
            assert!(s.as_slice().iter().all(|&v| v >= 0.0));
            assert_eq!(utb.grid(), grid);
        }
        _ => panic!("expected circulant spectral domain"),
    }
    assert_eq!(domain.magnitudes(), &expected);
}

#[test]
fn padded_transform_carries_adjoint_rhs() {
    let full = Grid2D::new(16, 16);
    let inner = Grid2D::new(8, 8);
    let ahat =
        ForwardOperator::frequency_kernel(&TestBackend, full, 0.5, 2.0, false, &GaussianKernel)
            .unwrap();
    let op = ForwardOperator::CirculantPadded {
        ahat,
        mask: pad_mask(inner, 4, 4),
        pad_x: 4,
        pad_y: 4,
    };
    let b = test_image(inner);
    let domain = SpectralDomain::transform(&TestBackend, &op, &b, &b).unwrap();

    match &domain {
        SpectralDomain::CirculantPadded { s, utb, atdb, .. } => {
            // Everything spectral lives on the full padded shape.
            assert_eq!(s.grid(), full);
            assert_eq!(utb.grid(), full);
            assert_eq!(atdb.grid(), full);
            assert!(atdb.norm() > 0.0);
        }
        _ => panic!("expected padded spectral domain"),
    }
    assert_eq!(domain.magnitudes().grid(), full);
    assert!(domain.magnitudes().as_slice().iter().all(|&v| v >= 0.0));
}

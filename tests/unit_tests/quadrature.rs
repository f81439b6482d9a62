use matrixcompare::assert_scalar_eq;
use porous_fem::element::ReferenceElement;
use porous_fem::quadrature::QuadratureRule;

#[test]
fn gauss_rules_integrate_reference_volume() {
    let quad = QuadratureRule::gauss(ReferenceElement::Quad4, 2);
    assert_eq!(quad.len(), 4);
    assert_scalar_eq!(quad.integrate(|_| 1.0), 4.0, comp = abs, tol = 1e-14);

    let hex = QuadratureRule::gauss(ReferenceElement::Hex8, 2);
    assert_eq!(hex.len(), 8);
    assert_scalar_eq!(hex.integrate(|_| 1.0), 8.0, comp = abs, tol = 1e-14);
}

#[test]
fn two_point_gauss_is_exact_for_cubics() {
    let quad = QuadratureRule::gauss(ReferenceElement::Quad4, 2);
    // ∫∫ x^3 y^2 + x^2 dx dy over [-1, 1]^2 = 0 + (2/3) * 2
    let integral = quad.integrate(|p| p.x.powi(3) * p.y.powi(2) + p.x * p.x);
    assert_scalar_eq!(integral, 4.0 / 3.0, comp = abs, tol = 1e-13);

    let hex = QuadratureRule::gauss(ReferenceElement::Hex8, 2);
    // ∫∫∫ x^2 y^2 z^2 = (2/3)^3
    let integral = hex.integrate(|p| (p.x * p.y * p.z).powi(2));
    assert_scalar_eq!(integral, 8.0 / 27.0, comp = abs, tol = 1e-13);
}

#[test]
fn face_rules_live_on_face_reference_domain() {
    let edge = QuadratureRule::gauss_face(ReferenceElement::Quad4, 3);
    assert_eq!(edge.len(), 3);
    assert_scalar_eq!(edge.integrate(|_| 1.0), 2.0, comp = abs, tol = 1e-14);
    assert!(edge.points().iter().all(|p| p.y == 0.0 && p.z == 0.0));

    let face = QuadratureRule::gauss_face(ReferenceElement::Hex8, 2);
    assert_eq!(face.len(), 4);
    assert_scalar_eq!(face.integrate(|_| 1.0), 4.0, comp = abs, tol = 1e-14);
    assert!(face.points().iter().all(|p| p.z == 0.0));
}

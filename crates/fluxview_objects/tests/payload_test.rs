//! Integration tests for payload fetching against the simulated duct case.

use fluxview_objects::{
    AxisScale, ColorRange, ContourProps, GraphicsKind, GraphicsObject, MeshProps, MonitorProps,
    ObjectError, PathlineProps, Payload, SurfaceProps, VectorProps, XyPlotProps,
};
use fluxview_shared::{IsoRendering, PlaneMethod, SimulatedSession, SurfaceDefinition};

fn fetch(session: &std::sync::Arc<SimulatedSession>, kind: impl Into<GraphicsKind>) -> Result<Payload, ObjectError> {
    GraphicsObject::new(session.clone(), kind).unwrap().fetch_payload()
}

#[test]
fn test_mesh_payload() {
    let session = SimulatedSession::duct("s1");
    let payload = fetch(&session, MeshProps::of(["wall", "inlet"])).unwrap();
    let Payload::Mesh(mesh) = payload else {
        panic!("expected mesh payload");
    };
    assert_eq!(mesh.meshes.len(), 2);
    assert_eq!(mesh.meshes[0].name, "wall");
    assert_eq!(mesh.meshes[0].cell_count(), 8);
    assert!(mesh.show_faces);
}

#[test]
fn test_nonexistent_field_is_reported() {
    let session = SimulatedSession::duct("s1");
    let err = fetch(&session, ContourProps::of("nonexistent", ["wall"])).unwrap_err();
    assert_eq!(err, ObjectError::FieldNotFound("nonexistent".to_string()));
}

#[test]
fn test_unknown_surface_checked_before_field() {
    let session = SimulatedSession::duct("s1");
    let err = fetch(&session, ContourProps::of("nonexistent", ["roof"])).unwrap_err();
    assert_eq!(err, ObjectError::SurfaceNotFound("roof".to_string()));
}

#[test]
fn test_incomplete_contour() {
    let session = SimulatedSession::duct("s1");
    let err = fetch(&session, ContourProps::default()).unwrap_err();
    assert_eq!(
        err,
        ObjectError::IncompleteDefinition {
            kind: "contour",
            missing: "field"
        }
    );
}

#[test]
fn test_contour_range_resolution() {
    let session = SimulatedSession::duct("s1");

    let local = fetch(&session, ContourProps::of("pressure", ["inlet"])).unwrap();
    assert_eq!(local.color_range(), Some((100.0, 100.0)));

    let mut global = ContourProps::of("pressure", ["inlet"]);
    global.range = ColorRange::AutoRangeOn { global_range: true };
    assert_eq!(fetch(&session, global).unwrap().color_range(), Some((60.0, 100.0)));

    let mut fixed = ContourProps::of("pressure", ["inlet"]);
    fixed.range = ColorRange::fixed(120.0, 50.0);
    assert_eq!(fetch(&session, fixed).unwrap().color_range(), Some((50.0, 120.0)));
}

#[test]
fn test_no_caching_between_fetches() {
    let session = SimulatedSession::duct("s1");
    let contour = GraphicsObject::new(session.clone(), ContourProps::of("pressure", ["outlet"])).unwrap();

    let first = contour.fetch_payload().unwrap();
    let requests = session.request_count();
    session.advance(1.0);
    let second = contour.fetch_payload().unwrap();

    assert!(session.request_count() > requests);
    assert_eq!(first.color_range(), Some((60.0, 60.0)));
    assert_eq!(second.color_range(), Some((20.0, 20.0)));
}

#[test]
fn test_vector_skip_masks_magnitudes() {
    let session = SimulatedSession::duct("s1");
    let mut props = VectorProps::on(["wall"]);
    props.skip = 1;
    let Payload::Vector(vector) = fetch(&session, props).unwrap() else {
        panic!("expected vector payload");
    };

    let magnitudes = &vector.magnitudes[0];
    assert_eq!(magnitudes.len(), 8);
    for (i, m) in magnitudes.iter().enumerate() {
        if i % 2 == 0 {
            assert!(*m > 1.0);
        } else {
            assert_eq!(*m, 0.0);
        }
    }
    assert!((magnitudes[0] - 1.125).abs() < 1e-12);
    assert!((magnitudes[2] - 1.625).abs() < 1e-12);
    assert!(vector.scalars.is_none());
    assert_eq!(vector.range, (0.0, 1.625));
}

#[test]
fn test_vector_unknown_vector_field() {
    let session = SimulatedSession::duct("s1");
    let mut props = VectorProps::on(["wall"]);
    props.vectors_of = "vorticity".to_string();
    assert_eq!(
        fetch(&session, props).unwrap_err(),
        ObjectError::FieldNotFound("vorticity".to_string())
    );
}

#[test]
fn test_pathlines_from_inlet() {
    let session = SimulatedSession::duct("s1");
    let payload = fetch(&session, PathlineProps::of("temperature", ["inlet"])).unwrap();
    assert_eq!(payload.kind(), "pathline");
    assert_eq!(payload.primitive_count(), 9);
}

#[test]
fn test_xy_plot_sorted_by_projection() {
    let session = SimulatedSession::duct("s1");
    let mut props = XyPlotProps::of("pressure", ["wall"]);
    props.direction_vector = [-2.0, 0.0, 0.0];
    let Payload::XyPlot(plot) = fetch(&session, props).unwrap() else {
        panic!("expected xy plot payload");
    };

    let curve = &plot.curves[0];
    assert_eq!(curve.label, "wall");
    assert_eq!(curve.x.len(), 15);
    assert!(curve.x.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!((curve.x[0] + 4.0).abs() < 1e-12);
    assert!((curve.y[0] - 60.0).abs() < 1e-12);
    assert_eq!(plot.y_scale, AxisScale::Linear);
}

#[test]
fn test_monitor_log_scale_for_residuals() {
    let session = SimulatedSession::duct("s1");

    let Payload::Monitor(residual) = fetch(&session, MonitorProps::of("residual")).unwrap() else {
        panic!("expected monitor payload");
    };
    assert_eq!(residual.y_scale, AxisScale::Log);
    assert_eq!(residual.curves.len(), 3);
    assert_eq!(residual.x_label, "iteration");

    let Payload::Monitor(mass) = fetch(&session, MonitorProps::of("mass-flow")).unwrap() else {
        panic!("expected monitor payload");
    };
    assert_eq!(mass.y_scale, AxisScale::Linear);

    assert_eq!(
        fetch(&session, MonitorProps::of("lift")).unwrap_err(),
        ObjectError::MonitorSetNotFound("lift".to_string())
    );
}

#[test]
fn test_transient_plane_is_deleted() {
    let session = SimulatedSession::duct("s1");
    let props = SurfaceProps::new(SurfaceDefinition::plane(PlaneMethod::XyPlane { z: 0.5 }));
    let Payload::Surface(surface) = fetch(&session, props).unwrap() else {
        panic!("expected surface payload");
    };
    assert_eq!(surface.definition_kind, "plane-surface");
    assert_eq!(surface.meshes[0].cell_count(), 16);
    assert!(surface.scalars.is_none());
    assert!(session.derived_surfaces().is_empty());
}

#[test]
fn test_contoured_iso_surface() {
    let session = SimulatedSession::duct("s1");
    let props = SurfaceProps::new(SurfaceDefinition::iso("temperature", None, IsoRendering::Contour));
    let Payload::Surface(surface) = fetch(&session, props).unwrap() else {
        panic!("expected surface payload");
    };
    assert_eq!(surface.definition_kind, "iso-surface");
    assert!(surface.scalars.is_some());
    assert!(surface.range.is_some());
    assert!(session.derived_surfaces().is_empty());
}

#[test]
fn test_iso_surface_needs_field() {
    let session = SimulatedSession::duct("s1");
    let err = fetch(&session, SurfaceProps::default()).unwrap_err();
    assert!(matches!(err, ObjectError::IncompleteDefinition { kind: "surface", .. }));

    let props = SurfaceProps::new(SurfaceDefinition::iso("density", Some(1.0), IsoRendering::Mesh));
    assert_eq!(
        fetch(&session, props).unwrap_err(),
        ObjectError::FieldNotFound("density".to_string())
    );
    assert!(session.derived_surfaces().is_empty());
}

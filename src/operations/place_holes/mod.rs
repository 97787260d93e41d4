mod report;
mod transaction;

pub use report::{BatchReport, BatchState, Diagnostic};
pub use transaction::TransactionScope;

use tracing::{debug, info, warn};

use super::{DedupeHits, FindIntersections, ResolvePlacement};
use crate::config::PlacementConfig;
use crate::error::{Precondition, PreconditionError, Result};
use crate::host::{
    ElementEnumerator, GeometrySource, HostEnvironment, ModelHandle, ModelLocator,
    PlaceholderHandle, PlaceholderType, PlacementSink, TransactionHost, TypeResolver, ViewContext,
};
use crate::model::{LinearElement, PlacementBatch};

/// Host resources resolved before a batch starts.
#[derive(Debug, Clone)]
pub struct BatchContext {
    /// The mechanical model holding ducts and pipes.
    pub source: ModelHandle,
    /// The model receiving placeholders; its walls are the ray targets.
    pub target: ModelHandle,
    pub placeholder: PlaceholderType,
    pub view: ViewContext,
}

/// Requests and diagnostics gathered from some set of elements.
///
/// Each element is collected independently, so partial results from
/// separate elements can be combined with [`merge`](Self::merge).
#[derive(Debug, Default)]
pub struct Collected {
    pub batch: PlacementBatch,
    pub diagnostics: Vec<Diagnostic>,
    pub elements: usize,
}

impl Collected {
    /// Appends `other` after the entries already collected.
    pub fn merge(&mut self, other: Collected) {
        self.batch.extend(other.batch);
        self.diagnostics.extend(other.diagnostics);
        self.elements += other.elements;
    }
}

/// Places a sized placeholder wherever a duct or pipe crosses a wall.
///
/// Runs in three steps: [`prepare`](Self::prepare) resolves the models,
/// placeholder type and 3D view; [`collect`](Self::collect) turns every
/// element into placement requests without touching the model; and
/// [`commit`](Self::commit) creates all placeholders in one transaction that
/// is rolled back entirely if any of them fails.
#[derive(Debug, Clone, Default)]
pub struct PlaceHoles {
    config: PlacementConfig,
}

impl PlaceHoles {
    #[must_use]
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Runs the whole batch against `host`.
    ///
    /// # Errors
    ///
    /// Returns a [`PreconditionError`] if any host resource is missing; the
    /// model is not touched in that case. Failures after that point are
    /// reported through the returned [`BatchReport`].
    pub fn execute<H: HostEnvironment + ?Sized>(&self, host: &mut H) -> Result<BatchReport> {
        let ctx = self.prepare(host)?;
        let mut report = BatchReport::new();

        info!(
            source = ctx.source.title(),
            target = ctx.target.title(),
            "collecting wall crossings"
        );
        let collected = self.collect(host, &ctx);
        report.elements = collected.elements;
        report.requests = collected.batch.len();
        report.diagnostics = collected.diagnostics;
        if !report.diagnostics.is_empty() {
            warn!(
                skipped_elements = report.skipped_elements(),
                skipped_hits = report.skipped_hits(),
                "some crossings could not be resolved"
            );
        }

        report.state = BatchState::Committing;
        if collected.batch.is_empty() {
            info!("no wall crossings, nothing to commit");
            report.state = BatchState::Succeeded;
            return Ok(report);
        }

        match self.commit(host, &ctx, &collected.batch) {
            Ok(placed) => {
                info!(placed = placed.len(), "holes placed");
                report.placed = placed;
                report.state = BatchState::Succeeded;
            }
            Err(error) => {
                warn!(%error, requests = report.requests, "batch failed");
                report.failure = Some(error);
                report.state = BatchState::Failed;
            }
        }
        Ok(report)
    }

    /// Resolves every host resource the batch needs.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::Unresolved`] naming every missing
    /// resource. The placeholder type and view are only looked up once the
    /// target model resolves.
    pub fn prepare<H>(&self, host: &H) -> Result<BatchContext>
    where
        H: ModelLocator + TypeResolver + ElementEnumerator + ?Sized,
    {
        let mut missing = Vec::new();

        let source = host.find_model_by_title_substring(&self.config.source_title_needle);
        if source.is_none() {
            missing.push(Precondition::SourceModel {
                needle: self.config.source_title_needle.clone(),
            });
        }

        let target = host.active_model();
        let (placeholder, view) = match &target {
            Some(target) => {
                let placeholder =
                    host.find_placeholder_type(target, &self.config.placeholder_family);
                if placeholder.is_none() {
                    missing.push(Precondition::PlaceholderType {
                        family: self.config.placeholder_family.clone(),
                    });
                }
                let view = host.first_non_template_3d_view(target);
                if view.is_none() {
                    missing.push(Precondition::View3D);
                }
                (placeholder, view)
            }
            None => {
                missing.push(Precondition::TargetModel);
                (None, None)
            }
        };

        match (source, target, placeholder, view) {
            (Some(source), Some(target), Some(placeholder), Some(view)) => Ok(BatchContext {
                source,
                target,
                placeholder,
                view,
            }),
            _ => {
                let error = PreconditionError::Unresolved { missing };
                warn!(%error, "batch aborted");
                Err(error.into())
            }
        }
    }

    /// Builds placement requests for every duct, then every pipe, of the
    /// source model. Nothing is written to the model.
    pub fn collect<H>(&self, host: &H, ctx: &BatchContext) -> Collected
    where
        H: ElementEnumerator + GeometrySource + ?Sized,
    {
        let mut collected = Collected::default();
        let ducts = host.all_ducts(&ctx.source);
        let pipes = host.all_pipes(&ctx.source);
        debug!(ducts = ducts.len(), pipes = pipes.len(), "elements enumerated");

        for element in ducts.iter().chain(&pipes) {
            collected.merge(self.collect_element(host, ctx, element));
        }
        collected
    }

    /// Builds the placement requests for a single element.
    ///
    /// A degenerate centerline or failed ray query skips the element; a wall
    /// without a level skips that crossing only. Both are recorded as
    /// diagnostics.
    pub fn collect_element<G>(
        &self,
        source: &G,
        ctx: &BatchContext,
        element: &LinearElement,
    ) -> Collected
    where
        G: GeometrySource + ?Sized,
    {
        let mut collected = Collected {
            elements: 1,
            ..Collected::default()
        };

        let hits = match FindIntersections::new(element, &self.config.barrier_filter, &ctx.view)
            .execute(source, &ctx.target)
        {
            Ok(hits) => hits,
            Err(error) => {
                warn!(element = %element.id, kind = %element.kind, %error, "element skipped");
                collected.diagnostics.push(Diagnostic {
                    element: element.id,
                    kind: element.kind,
                    error,
                });
                return collected;
            }
        };

        for hit in DedupeHits::new(hits).execute() {
            match ResolvePlacement::new(&hit, element).execute(source, &ctx.target) {
                Ok(request) => collected.batch.push(request),
                Err(error) => {
                    warn!(
                        element = %element.id,
                        barrier = %hit.barrier(),
                        %error,
                        "crossing skipped"
                    );
                    collected.diagnostics.push(Diagnostic {
                        element: element.id,
                        kind: element.kind,
                        error,
                    });
                }
            }
        }
        collected
    }

    /// Creates every requested placeholder inside one transaction.
    ///
    /// Activates the placeholder type first if needed, then creates each
    /// placeholder and sets its width and height.
    ///
    /// # Errors
    ///
    /// Returns the first sink or transaction error; the transaction is
    /// rolled back and no placeholder survives.
    pub fn commit<H>(
        &self,
        host: &mut H,
        ctx: &BatchContext,
        batch: &PlacementBatch,
    ) -> Result<Vec<PlaceholderHandle>>
    where
        H: TypeResolver + PlacementSink + TransactionHost + ?Sized,
    {
        let mut tx = TransactionScope::begin(host, &ctx.target, &self.config.transaction_label)?;
        let host = tx.host_mut();

        if !ctx.placeholder.is_active {
            host.activate(&ctx.target, &ctx.placeholder)?;
        }

        let mut placed = Vec::with_capacity(batch.len());
        for (index, request) in batch.iter().enumerate() {
            let handle = host
                .create_placeholder(
                    &ctx.target,
                    &request.insertion_point,
                    &ctx.placeholder,
                    &request.barrier,
                    request.level,
                )
                .inspect_err(|error| {
                    warn!(index, element = %request.element, %error, "placeholder creation failed");
                })?;
            host.set_parameter(&ctx.target, handle, &self.config.width_parameter, request.width)?;
            host.set_parameter(&ctx.target, handle, &self.config.height_parameter, request.height)?;
            placed.push(handle);
        }

        tx.commit()?;
        Ok(placed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{GeometryError, PlacementError, SinkError};
    use crate::host::memory::{DocumentId, MemoryHost};
    use crate::math::{Isometry3, Point3};
    use crate::model::{BarrierId, DocumentTag, ElementId, ElementKind, LevelId};
    use crate::operations::testing::ScriptedSource;
    use crate::PerforaError;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    struct Project {
        host: MemoryHost,
        arch: DocumentId,
        mep: DocumentId,
        level: LevelId,
        walls: Vec<ElementId>,
    }

    /// Architectural model with walls along Y whose near faces sit at
    /// x = 3 and x = 7, plus an empty mechanical model.
    fn project() -> Project {
        init_tracing();
        let mut host = MemoryHost::new();
        let arch = host.add_document("Project_AR");
        let mep = host.add_document("Project_ОВ");
        host.set_active(arch);

        let doc = host.document_mut(arch).unwrap();
        let level = doc.add_level("L1", -1.0);
        let walls = [3.1, 7.1]
            .into_iter()
            .map(|x| {
                doc.add_wall(p(x, -5.0, -1.0), p(x, 5.0, -1.0), 0.2, 4.0, Some(level))
                    .unwrap()
            })
            .collect();
        doc.add_view_3d(true);
        doc.add_view_3d(false);
        doc.add_placeholder_family("Отверстие", &["ширина", "высота"], false);

        Project {
            host,
            arch,
            mep,
            level,
            walls,
        }
    }

    impl Project {
        fn mep(&mut self) -> &mut crate::host::memory::Document {
            self.host.document_mut(self.mep).unwrap()
        }

        fn placeholders(&self) -> Vec<crate::host::memory::PlaceholderData> {
            let mut all: Vec<_> = self
                .host
                .document(self.arch)
                .unwrap()
                .placeholders()
                .cloned()
                .collect();
            all.sort_by(|a, b| a.point.x.total_cmp(&b.point.x));
            all
        }

        fn type_is_active(&self) -> bool {
            let model = self.host.handle(self.arch).unwrap();
            self.host
                .find_placeholder_type(&model, "Отверстие")
                .unwrap()
                .is_active
        }
    }

    #[test]
    fn duct_through_two_walls() {
        let mut project = project();
        project.mep().add_duct(p(0.0, 0.0, 0.0), p(10.0, 0.0, 0.0), 0.3);

        let report = PlaceHoles::default().execute(&mut project.host).unwrap();

        assert!(report.is_success(), "{report}");
        assert_eq!(report.requests, 2);
        assert_eq!(report.placed.len(), 2);
        let holes = project.placeholders();
        assert_eq!(holes.len(), 2);
        assert_relative_eq!(holes[0].point, p(3.0, 0.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(holes[1].point, p(7.0, 0.0, 0.0), epsilon = 1e-9);
        for (hole, wall) in holes.iter().zip(&project.walls) {
            assert_eq!(hole.barrier, BarrierId::host(*wall));
            assert_eq!(hole.level, project.level);
            assert_relative_eq!(hole.parameters["ширина"], 0.3);
            assert_relative_eq!(hole.parameters["высота"], 0.3);
        }
        assert!(project.type_is_active());
        assert!(project.host.open_transaction().is_none());
    }

    #[test]
    fn short_pipe_only_reaches_first_wall() {
        let mut project = project();
        project.mep().add_pipe(p(0.0, 1.0, 0.5), p(5.0, 1.0, 0.5), 0.05);

        let report = PlaceHoles::default().execute(&mut project.host).unwrap();

        assert_eq!(report.placed.len(), 1);
        let holes = project.placeholders();
        assert_relative_eq!(holes[0].point, p(3.0, 1.0, 0.5), epsilon = 1e-9);
        assert_relative_eq!(holes[0].parameters["ширина"], 0.05);
    }

    #[test]
    fn zero_length_element_is_skipped() {
        let mut project = project();
        let stub = project.mep().add_pipe(p(1.0, 1.0, 0.0), p(1.0, 1.0, 0.0), 0.1);
        project.mep().add_duct(p(0.0, 0.0, 0.0), p(10.0, 0.0, 0.0), 0.3);

        let report = PlaceHoles::default().execute(&mut project.host).unwrap();

        assert!(report.is_success());
        assert_eq!(report.elements, 2);
        assert_eq!(report.placed.len(), 2);
        assert_eq!(report.skipped_elements(), 1);
        assert_eq!(report.diagnostics.len(), 1);
        let diagnostic = &report.diagnostics[0];
        assert_eq!(diagnostic.element, stub);
        assert!(matches!(
            diagnostic.error,
            PerforaError::Geometry(GeometryError::Degenerate(_))
        ));
    }

    #[test]
    fn unusable_diameter_skips_only_that_element() {
        let mut project = project();
        project.mep().add_duct(p(0.0, 0.0, 0.0), p(10.0, 0.0, 0.0), 0.3);
        let bad = project.mep().add_pipe(p(0.0, 2.0, 0.0), p(10.0, 2.0, 0.0), f64::NAN);

        let report = PlaceHoles::default().execute(&mut project.host).unwrap();

        assert!(report.is_success(), "{report}");
        assert_eq!(report.placed.len(), 2);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].element, bad);
        assert!(matches!(
            report.diagnostics[0].error,
            PerforaError::Geometry(GeometryError::Degenerate(_))
        ));
        let holes = project.placeholders();
        assert_eq!(holes.len(), 2);
        assert!(holes.iter().all(|h| h.parameters["ширина"] > 0.0));
    }

    #[test]
    fn failed_ray_query_skips_the_element() {
        let source = ScriptedSource::failing("view is hidden");
        let ctx = BatchContext {
            source: ModelHandle::new(2, "Project_ОВ"),
            target: ModelHandle::new(1, "Project_AR"),
            placeholder: PlaceholderType {
                id: ElementId(3),
                family: "Отверстие".to_owned(),
                is_active: true,
            },
            view: ViewContext { id: ElementId(4) },
        };
        let element = LinearElement::from_endpoints(
            ElementId(9),
            ElementKind::Duct,
            p(0.0, 0.0, 0.0),
            p(10.0, 0.0, 0.0),
            0.3,
        );

        let collected = PlaceHoles::default().collect_element(&source, &ctx, &element);

        assert_eq!(collected.elements, 1);
        assert!(collected.batch.is_empty());
        assert_eq!(collected.diagnostics.len(), 1);
        assert_eq!(collected.diagnostics[0].element, element.id);
        assert_eq!(collected.diagnostics[0].kind, ElementKind::Duct);
        assert!(matches!(
            collected.diagnostics[0].error,
            PerforaError::Geometry(GeometryError::RayQuery(_))
        ));
    }

    #[test]
    fn missing_view_aborts_before_any_element() {
        let mut project = project();
        project.mep().add_duct(p(0.0, 0.0, 0.0), p(10.0, 0.0, 0.0), 0.3);
        let arch = project.host.document_mut(project.arch).unwrap();
        *arch = {
            let mut doc = crate::host::memory::Document::new("Project_AR");
            let level = doc.add_level("L1", -1.0);
            doc.add_wall(p(3.1, -5.0, -1.0), p(3.1, 5.0, -1.0), 0.2, 4.0, Some(level))
                .unwrap();
            doc.add_view_3d(true);
            doc.add_placeholder_family("Отверстие", &["ширина", "высота"], false);
            doc
        };

        let result = PlaceHoles::default().execute(&mut project.host);

        match result {
            Err(PerforaError::Precondition(error)) => {
                assert_eq!(error.missing(), [Precondition::View3D]);
            }
            other => panic!("expected precondition failure, got {other:?}"),
        }
        assert!(project.placeholders().is_empty());
        assert!(!project.type_is_active());
        assert!(project.host.open_transaction().is_none());
    }

    #[test]
    fn every_missing_precondition_is_named() {
        let mut host = MemoryHost::new();
        host.add_document("Project_AR");

        let error = PlaceHoles::default().prepare(&host).unwrap_err();
        match error {
            PerforaError::Precondition(error) => {
                assert_eq!(
                    error.missing(),
                    [
                        Precondition::SourceModel {
                            needle: "ОВ".to_owned()
                        },
                        Precondition::TargetModel,
                    ]
                );
                assert!(error.to_string().contains("active target model"));
            }
            other => panic!("expected precondition failure, got {other:?}"),
        }
    }

    #[test]
    fn missing_family_is_reported() {
        let project = project();
        let config = PlacementConfig::default().with_placeholder_family("Sleeve");

        let error = PlaceHoles::new(config).prepare(&project.host).unwrap_err();
        let PerforaError::Precondition(error) = error else {
            panic!("expected precondition failure");
        };
        assert_eq!(
            error.missing(),
            [Precondition::PlaceholderType {
                family: "Sleeve".to_owned()
            }]
        );
    }

    #[test]
    fn failure_mid_commit_leaves_model_untouched() {
        let mut project = project();
        project.mep().add_duct(p(0.0, 0.0, 0.0), p(10.0, 0.0, 0.0), 0.3);
        project.mep().add_pipe(p(0.0, 2.0, 0.0), p(10.0, 2.0, 0.0), 0.1);
        project.host.fail_creation_at(3);

        let report = PlaceHoles::default().execute(&mut project.host).unwrap();

        assert_eq!(report.state, BatchState::Failed);
        assert_eq!(report.requests, 4);
        assert!(report.placed.is_empty());
        assert!(matches!(
            report.failure,
            Some(PerforaError::Sink(SinkError::CreationFailed(_)))
        ));
        assert!(report.to_string().starts_with("rolled back"));
        assert!(project.placeholders().is_empty());
        assert!(!project.type_is_active());
        assert!(project.host.open_transaction().is_none());
    }

    #[test]
    fn missing_size_parameter_fails_the_batch() {
        let mut project = project();
        project.mep().add_duct(p(0.0, 0.0, 0.0), p(10.0, 0.0, 0.0), 0.3);
        let config = PlacementConfig::default().with_size_parameters("Width", "Height");

        let report = PlaceHoles::new(config).execute(&mut project.host).unwrap();

        assert_eq!(report.state, BatchState::Failed);
        assert!(matches!(
            report.failure,
            Some(PerforaError::Sink(SinkError::ParameterMissing { .. }))
        ));
        assert!(project.placeholders().is_empty());
    }

    #[test]
    fn wall_without_level_skips_only_that_crossing() {
        let mut project = project();
        let arch = project.host.document_mut(project.arch).unwrap();
        let orphan = arch
            .add_wall(p(5.1, -5.0, -1.0), p(5.1, 5.0, -1.0), 0.2, 4.0, None)
            .unwrap();
        project.mep().add_duct(p(0.0, 0.0, 0.0), p(10.0, 0.0, 0.0), 0.3);

        let report = PlaceHoles::default().execute(&mut project.host).unwrap();

        assert!(report.is_success());
        assert_eq!(report.placed.len(), 2);
        assert_eq!(report.skipped_hits(), 1);
        match &report.diagnostics[0].error {
            PerforaError::Placement(PlacementError::MissingLevel { barrier }) => {
                assert_eq!(*barrier, BarrierId::host(orphan));
            }
            other => panic!("expected MissingLevel, got {other:?}"),
        }
    }

    #[test]
    fn linked_wall_gets_its_own_hole() {
        let mut project = project();
        let kr = project.host.add_document("Project_KR");
        let kr_doc = project.host.document_mut(kr).unwrap();
        let kr_level = kr_doc.add_level("L1", -1.0);
        let kr_wall = kr_doc
            .add_wall(p(0.0, -5.0, -1.0), p(0.0, 5.0, -1.0), 0.2, 4.0, Some(kr_level))
            .unwrap();
        let shift = Isometry3::from_parts(
            Translation3::new(5.1, 0.0, 0.0),
            UnitQuaternion::identity(),
        );
        let link = project
            .host
            .document_mut(project.arch)
            .unwrap()
            .add_link(kr, shift);
        project.mep().add_duct(p(0.0, 0.0, 0.0), p(10.0, 0.0, 0.0), 0.3);

        let report = PlaceHoles::default().execute(&mut project.host).unwrap();

        assert!(report.is_success(), "{report}");
        let holes = project.placeholders();
        assert_eq!(holes.len(), 3);
        assert_eq!(holes[1].barrier, BarrierId::linked(link, kr_wall));
        assert_eq!(holes[1].barrier.document, DocumentTag::Link(link));
        assert_relative_eq!(holes[1].point, p(5.0, 0.0, 0.0), epsilon = 1e-9);
        assert_eq!(holes[1].level, project.level);
    }

    #[test]
    fn holes_lie_on_their_segments() {
        let mut project = project();
        let segments = [
            (p(0.0, -4.0, 0.0), p(9.0, 4.0, 1.0), 0.2),
            (p(10.0, 3.0, 2.5), p(-1.0, -3.0, 0.0), 0.15),
            (p(2.0, 0.5, 0.3), p(8.5, 0.5, 0.3), 0.4),
        ];
        for (start, end, diameter) in segments {
            project.mep().add_pipe(start, end, diameter);
        }

        let host = &project.host;
        let ctx = PlaceHoles::default().prepare(host).unwrap();
        let collected = PlaceHoles::default().collect(host, &ctx);
        assert!(collected.diagnostics.is_empty());
        assert_eq!(collected.batch.len(), 6);

        let pipes = host.all_pipes(&ctx.source);
        for request in &collected.batch {
            let element = pipes.iter().find(|e| e.id == request.element).unwrap();
            let along = (request.insertion_point - element.start).dot(&element.direction);
            let off_axis = (request.insertion_point - element.start) - element.direction * along;
            assert!(along >= -1e-9 && along <= element.length + 1e-9);
            assert!(off_axis.norm() < 1e-9);
            assert_relative_eq!(request.width, element.diameter);
            assert_relative_eq!(request.height, element.diameter);
            assert_eq!(request.level, request.barrier.vertical_reference);
        }
    }

    #[test]
    fn nothing_to_place_skips_the_transaction() {
        let mut project = project();
        project.mep().add_duct(p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), 0.3);

        let report = PlaceHoles::default().execute(&mut project.host).unwrap();

        assert!(report.is_success());
        assert_eq!(report.requests, 0);
        assert!(!project.type_is_active());
        assert_eq!(report.to_string(), "placed 0 of 0 holes across 1 element");
    }
}

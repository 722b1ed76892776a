//! Fixed catalog of reconstruction steps.
//!
//! Each step is one COLMAP or OpenMVS invocation. Argument lists may contain
//! `%name%` placeholders that [`crate::placeholder`] fills from the run
//! configuration. The catalog order and the file names exchanged between
//! steps (`colmap.db`, `sparse/0`, `dense`, `scene*.mvs`) are what the
//! external tools expect and must not drift.

use std::path::{Path, PathBuf};

use tool_exec::find_executable;

use crate::error::PipelineError;

pub const STEP_COUNT: usize = 13;

pub const FEATURE_EXTRACTION_STEP: usize = 0;
pub const MAPPER_STEP: usize = 2;
pub const RECONSTRUCT_MESH_STEP: usize = 8;
pub const REFINE_MESH_STEP: usize = 9;
pub const TEXTURE_MESH_STEP: usize = 10;

/// Fallback OpenMVS binary directory when `ReconstructMesh` is not on `PATH`.
pub const DEFAULT_OPENMVS_DIR: &str = "/home/openMVS/openMVS_build/bin";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tool {
    Colmap,
    OpenMvs(&'static str),
}

struct StepSpec {
    label: &'static str,
    tool: Tool,
    args: &'static [&'static str],
}

const CATALOG: [StepSpec; STEP_COUNT] = [
    StepSpec {
        label: "Colmap Feature Extraction",
        tool: Tool::Colmap,
        args: &[
            "feature_extractor",
            "--database_path",
            "%output_dir%/colmap.db",
            "--image_path",
            "%input_dir%/images",
            "--ImageReader.camera_model",
            "%camera_model%",
            "--ImageReader.single_camera",
            "1",
        ],
    },
    StepSpec {
        label: "Colmap Exhaustive Matcher",
        tool: Tool::Colmap,
        args: &[
            "exhaustive_matcher",
            "--database_path",
            "%output_dir%/colmap.db",
            "--SiftMatching.guided_matching=true",
        ],
    },
    StepSpec {
        label: "Colmap Mapper",
        tool: Tool::Colmap,
        args: &[
            "mapper",
            "--database_path",
            "%output_dir%/colmap.db",
            "--image_path",
            "%input_dir%/images",
            "--output_path",
            "%sparse_dir%",
            "--Mapper.extract_colors",
            "%colored_points%",
        ],
    },
    StepSpec {
        label: "Colmap Bundle Adjuster",
        tool: Tool::Colmap,
        args: &[
            "bundle_adjuster",
            "--input_path",
            "%sparse_dir%/0",
            "--output_path",
            "%sparse_dir%/0",
            "--BundleAdjustment.refine_principal_point",
            "1",
        ],
    },
    StepSpec {
        label: "Colmap Undistorting Images",
        tool: Tool::Colmap,
        args: &[
            "image_undistorter",
            "--image_path",
            "%input_dir%/images",
            "--input_path",
            "%sparse_dir%/0",
            "--output_path",
            "%dense_dir%",
            "--output_type",
            "COLMAP",
        ],
    },
    StepSpec {
        label: "Colmap Model Converter",
        tool: Tool::Colmap,
        args: &[
            "model_converter",
            "--input_path",
            "%dense_dir%/sparse",
            "--output_path",
            "%dense_dir%/sparse",
            "--output_type",
            "TXT",
        ],
    },
    StepSpec {
        label: "Create MVS Scene",
        tool: Tool::OpenMvs("InterfaceCOLMAP"),
        args: &[
            "-w",
            "%mvs_dir%",
            "-i",
            "%dense_dir%",
            "-o",
            "%mvs_dir%/scene.mvs",
        ],
    },
    StepSpec {
        label: "Densify point cloud",
        tool: Tool::OpenMvs("DensifyPointCloud"),
        args: &["scene.mvs", "-w", "%mvs_dir%"],
    },
    StepSpec {
        label: "Reconstruct the mesh",
        tool: Tool::OpenMvs("ReconstructMesh"),
        args: &["scene_dense.mvs", "-w", "%mvs_dir%"],
    },
    StepSpec {
        label: "Refine the mesh",
        tool: Tool::OpenMvs("RefineMesh"),
        args: &[
            "scene_dense_mesh.mvs",
            "-w",
            "%mvs_dir%",
            "--resolution-level",
            "1",
            "--cuda-device",
            "-1",
        ],
    },
    StepSpec {
        label: "Texture the mesh",
        tool: Tool::OpenMvs("TextureMesh"),
        args: &[
            "scene_dense_mesh_refine.mvs",
            "-w",
            "%mvs_dir%",
            "--empty-color",
            "%empty_color%",
        ],
    },
    StepSpec {
        label: "Estimate disparity-maps",
        tool: Tool::OpenMvs("DensifyPointCloud"),
        args: &[
            "scene.mvs",
            "--dense-config-file",
            "Densify.ini",
            "--fusion-mode",
            "-1",
            "-w",
            "%mvs_dir%",
        ],
    },
    StepSpec {
        label: "Fuse disparity-maps",
        tool: Tool::OpenMvs("DensifyPointCloud"),
        args: &[
            "scene.mvs",
            "--dense-config-file",
            "Densify.ini",
            "--fusion-mode",
            "-2",
            "-w",
            "%mvs_dir%",
        ],
    },
];

/// Where the COLMAP and OpenMVS executables live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolPaths {
    pub colmap: PathBuf,
    pub openmvs_dir: PathBuf,
}

impl ToolPaths {
    pub fn new(colmap: impl Into<PathBuf>, openmvs_dir: impl Into<PathBuf>) -> Self {
        Self {
            colmap: colmap.into(),
            openmvs_dir: openmvs_dir.into(),
        }
    }

    /// Fill unset locations from the search path.
    ///
    /// COLMAP falls back to the bare `colmap` name so the OS resolves it at
    /// spawn time; OpenMVS falls back to [`DEFAULT_OPENMVS_DIR`].
    pub fn discover(colmap: Option<PathBuf>, openmvs_dir: Option<PathBuf>) -> Self {
        let colmap = colmap.unwrap_or_else(|| {
            let name = if cfg!(windows) { "colmap.bat" } else { "colmap" };
            find_executable(name).unwrap_or_else(|| PathBuf::from(name))
        });
        let openmvs_dir = openmvs_dir.unwrap_or_else(|| {
            find_executable("ReconstructMesh")
                .and_then(|path| path.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OPENMVS_DIR))
        });
        Self {
            colmap,
            openmvs_dir,
        }
    }
}

/// One external tool invocation in the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub index: usize,
    pub label: &'static str,
    pub command: PathBuf,
    pub args: Vec<String>,
}

/// Ordered, read-only collection of steps addressed by stable index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepRegistry {
    steps: Vec<Step>,
}

impl StepRegistry {
    /// Build the standard catalog with commands rooted at `tools`.
    pub fn new(tools: &ToolPaths) -> Self {
        let steps = CATALOG
            .iter()
            .enumerate()
            .map(|(index, entry)| Step {
                index,
                label: entry.label,
                command: match entry.tool {
                    Tool::Colmap => tools.colmap.clone(),
                    Tool::OpenMvs(binary) => tools.openmvs_dir.join(binary),
                },
                args: entry.args.iter().map(|arg| arg.to_string()).collect(),
            })
            .collect();
        Self { steps }
    }

    /// Wrap already-derived steps. Indices must match positions.
    pub(crate) fn from_steps(steps: Vec<Step>) -> Self {
        debug_assert!(steps.iter().enumerate().all(|(i, s)| s.index == i));
        Self { steps }
    }

    pub fn get(&self, index: usize) -> Result<&Step, PipelineError> {
        self.steps.get(index).ok_or(PipelineError::InvalidIndex {
            index,
            len: self.steps.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// One line per step: `index. label  command`.
    pub fn describe(&self) -> String {
        self.steps
            .iter()
            .map(|step| {
                format!(
                    "{:>4}. {:<28} {}",
                    step.index,
                    step.label,
                    step.command.display()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Labels of the standard catalog, in index order.
pub fn labels() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|entry| entry.label)
}

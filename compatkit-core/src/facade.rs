//! Memoized, read-only view over a legacy app, and the trees the compat build consumes.

use crate::engine::environment_config_path;
use crate::ports::{LegacyApp, PackageRootLocator, PatternOptions};
use crate::settings::FacadeSettings;
use camino::{Utf8Path, Utf8PathBuf};
use compatkit_domain::{
    CompatError, DiagnosticsSink, EnvFlags, ImportCategorizer, OwnPackage, PipelineBuilder,
    PipelineInputs, PluginResolver, find_module_api,
};
use compatkit_types::pipeline::PluginPipeline;
use compatkit_types::tree::{AnalyzerRequest, FunnelOptions, ScriptTag, Tree};
use serde_json::Value;
use std::cell::OnceCell;
use tracing::debug;

/// The app's configuration as a tree, plus where the active environment lives in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    tree: Tree,
    environment: String,
}

impl ConfigSource {
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_path(&self) -> String {
        environment_config_path(&self.environment)
    }
}

/// Result of [`LegacyAppFacade::process_app_js`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedAppJs {
    pub app_js: Tree,
    pub analyzer: AnalyzerRequest,
}

pub struct LegacyAppFacade<'a> {
    app: &'a dyn LegacyApp,
    locator: &'a dyn PackageRootLocator,
    diagnostics: &'a dyn DiagnosticsSink,
    settings: FacadeSettings,

    root: OnceCell<Utf8PathBuf>,
    module_unification: OnceCell<bool>,
    config: OnceCell<ConfigSource>,
    tracked_imports: OnceCell<ImportCategorizer<'a>>,
}

impl<'a> LegacyAppFacade<'a> {
    pub fn new(
        app: &'a dyn LegacyApp,
        locator: &'a dyn PackageRootLocator,
        diagnostics: &'a dyn DiagnosticsSink,
        settings: FacadeSettings,
    ) -> Self {
        Self {
            app,
            locator,
            diagnostics,
            settings,
            root: OnceCell::new(),
            module_unification: OnceCell::new(),
            config: OnceCell::new(),
            tracked_imports: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.app.package_name()
    }

    pub fn environment(&self) -> &str {
        self.app.environment()
    }

    pub fn auto_run(&self) -> bool {
        self.app.auto_run()
    }

    /// Nearest directory at or above the app root that holds a `package.json`.
    pub fn root(&self) -> Result<&Utf8Path, CompatError> {
        if let Some(root) = self.root.get() {
            return Ok(root);
        }
        let start = self.app.app_root();
        let found = self
            .locator
            .locate(start)
            .ok_or_else(|| CompatError::PackageRootNotFound {
                start: start.to_path_buf(),
            })?;
        debug!(root = found.as_str(), "located package root");
        Ok(self.root.get_or_init(|| found))
    }

    pub fn is_module_unification(&self) -> bool {
        *self
            .module_unification
            .get_or_init(|| self.app.module_unification_enabled() && self.app.has_src_tree())
    }

    pub fn config(&self) -> &ConfigSource {
        self.config.get_or_init(|| {
            let config_dir = self
                .app
                .config_path()
                .parent()
                .map(Utf8Path::to_string)
                .unwrap_or_default();
            ConfigSource {
                tree: Tree::ConfigLoader {
                    config_dir,
                    environment: self.environment().to_string(),
                    tests: self.app.tests_enabled(),
                },
                environment: self.environment().to_string(),
            }
        })
    }

    pub fn tracked_imports(&self) -> &ImportCategorizer<'a> {
        self.tracked_imports.get_or_init(|| {
            let directives = self
                .app
                .tracked_imports()
                .map(<[_]>::to_vec)
                .unwrap_or_default();
            ImportCategorizer::new(self.name(), directives, self.diagnostics)
                .with_standard_vendor_output(self.settings.standard_vendor_output.clone())
        })
    }

    pub fn root_tree(&self) -> Result<Tree, CompatError> {
        Ok(Tree::source(self.root()?.as_str()))
    }

    pub fn public_tree(&self) -> Tree {
        Tree::input("public")
    }

    /// The app's own JS sources: its `app` tree without styles or HTML.
    pub fn app_tree(&self) -> Tree {
        Tree::funnel(
            Tree::input("app"),
            FunnelOptions {
                exclude: vec!["styles/**".to_string(), "*.html".to_string()],
                ..Default::default()
            },
        )
    }

    /// Entry HTML with config placeholders replaced.
    ///
    /// In module-unification mode `src/ui/index.html` overrides the classic `app/index.html`.
    pub fn html_tree(&self) -> Result<Tree, CompatError> {
        let html_path = self.app.output_paths().app.html.clone();
        let root = self.root_tree()?;

        let classic = Tree::funnel(
            root.clone(),
            FunnelOptions {
                files: vec!["app/index.html".to_string()],
                destination: Some(html_path.clone()),
                allow_empty: true,
                annotation: Some("classic index.html".to_string()),
                ..Default::default()
            },
        );

        let index = if self.is_module_unification() {
            let unified = Tree::funnel(
                root,
                FunnelOptions {
                    files: vec!["src/ui/index.html".to_string()],
                    destination: Some(html_path.clone()),
                    annotation: Some("MU index.html".to_string()),
                    ..Default::default()
                },
            );
            Tree::merge(
                vec![classic, unified],
                true,
                Some("merge classic and MU index.html"),
            )
        } else {
            classic
        };

        let config = self.config();
        let patterns = self.app.config_replace_patterns(&PatternOptions {
            auto_run: self.auto_run(),
            store_config_in_meta: self.app.store_config_in_meta(),
            module_unification: self.is_module_unification(),
        });

        Ok(Tree::ConfigReplace {
            input: Box::new(index),
            config: Box::new(config.tree().clone()),
            config_path: config.config_path(),
            files: vec![html_path],
            patterns,
        })
    }

    /// Combined app JS, plus the analyzer request over the app's own sources only.
    pub fn process_app_js(&self, from_extensions: Vec<Tree>, package: &Value) -> ProcessedAppJs {
        let app_tree = self.app_tree();
        let config = self.config();
        let write_config = Tree::WriteConfig {
            config: Box::new(config.tree().clone()),
            config_path: config.config_path(),
            store_in_meta: self.app.store_config_in_meta(),
            app_name: self.name().to_string(),
        };

        let mut inputs = from_extensions;
        inputs.push(app_tree.clone());
        inputs.push(write_config);

        ProcessedAppJs {
            app_js: Tree::merge(inputs, true, None),
            analyzer: AnalyzerRequest {
                trees: vec![app_tree],
                package: package.clone(),
                is_app: true,
            },
        }
    }

    pub fn babel_config(
        &self,
        final_root: &Utf8Path,
        resolver: &dyn PluginResolver,
        env: &EnvFlags,
    ) -> Result<PluginPipeline, CompatError> {
        let module_api = find_module_api(
            self.app.extensions(),
            &self.settings.pipeline.module_api_extension,
        )?;
        let inputs = PipelineInputs {
            configured: self.app.configured_plugins().unwrap_or_default(),
            final_root,
            own: OwnPackage {
                name: self.name(),
                renamed_modules: self.app.renamed_modules(),
            },
            env,
            module_api,
        };
        PipelineBuilder::new(self.settings.pipeline.clone()).build(
            &inputs,
            resolver,
            self.diagnostics,
        )
    }

    pub fn find_app_script<'s>(&self, scripts: &'s [ScriptTag]) -> Option<&'s ScriptTag> {
        find_script(scripts, &self.app.output_paths().app.js)
    }

    pub fn find_vendor_script<'s>(&self, scripts: &'s [ScriptTag]) -> Option<&'s ScriptTag> {
        find_script(scripts, &self.app.output_paths().vendor.js)
    }
}

fn find_script<'s>(scripts: &'s [ScriptTag], src: &str) -> Option<&'s ScriptTag> {
    scripts.iter().find(|s| s.src.as_deref() == Some(src))
}

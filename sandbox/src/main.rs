// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Ember Sandbox
// Builds an entity whose renderer depends on a transform and on a loaded asset.

use std::any::Any;
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use ember_core::{AssetData, AssetId, AssetType, EntityId, ServiceTag};
use ember_data::ecs::{ActivationError, Component, Entity};
use ember_io::asset::{
    AssetCallbacks, AssetDatabase, AssetDatabaseConfig, AssetError, AssetHandle, AssetHandler,
    AssetPayload, FileCatalog, LoadContext,
};

const TRANSFORM: ServiceTag = ServiceTag::from_name("transform");
const RENDER: ServiceTag = ServiceTag::from_name("render");

/// A shader source loaded from a text file.
#[derive(Debug, Default)]
struct ShaderSource {
    code: String,
}

impl AssetData for ShaderSource {
    fn asset_type() -> AssetType {
        AssetType::from_name("shader")
    }
}

struct ShaderHandler;

impl AssetHandler for ShaderHandler {
    fn create_asset(&self, _id: &AssetId, _asset_type: &AssetType) -> Option<AssetPayload> {
        Some(Box::new(ShaderSource::default()))
    }

    fn load_asset_data(
        &self,
        ctx: &LoadContext<'_>,
        payload: &mut AssetPayload,
        stream: &mut dyn Read,
    ) -> Result<(), AssetError> {
        let shader = payload
            .downcast_mut::<ShaderSource>()
            .ok_or_else(|| AssetError::decode(*ctx.id(), "payload is not a shader"))?;
        stream.read_to_string(&mut shader.code)?;
        Ok(())
    }

    fn handled_asset_types(&self) -> Vec<AssetType> {
        vec![ShaderSource::asset_type()]
    }
}

struct Transform {
    position: [f32; 3],
}

impl Component for Transform {
    fn provided_services(&self) -> Vec<ServiceTag> {
        vec![TRANSFORM]
    }

    fn activate(&mut self) -> Result<(), ActivationError> {
        log::info!("Transform active at {:?}", self.position);
        Ok(())
    }

    fn deactivate(&mut self) {
        log::info!("Transform inactive");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Renderer {
    owner: Option<EntityId>,
    shader: AssetHandle,
}

impl Component for Renderer {
    fn provided_services(&self) -> Vec<ServiceTag> {
        vec![RENDER]
    }

    fn required_services(&self) -> Vec<ServiceTag> {
        vec![TRANSFORM]
    }

    fn attached(&mut self, owner: EntityId) {
        self.owner = Some(owner);
    }

    fn detached(&mut self) {
        self.owner = None;
    }

    fn activate(&mut self) -> Result<(), ActivationError> {
        if !self.shader.is_ready() {
            return Err(ActivationError::new(format!(
                "shader {} is {:?}",
                self.shader.id(),
                self.shader.status()
            )));
        }
        let lines = self
            .shader
            .read(|shader: &ShaderSource| shader.code.lines().count())
            .unwrap_or(0);
        log::info!(
            "Renderer of entity {:?} active with a {lines}-line shader",
            self.owner
        );
        Ok(())
    }

    fn deactivate(&mut self) {
        log::info!("Renderer inactive");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn load_config() -> Result<AssetDatabaseConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file '{path}'"))?;
            AssetDatabaseConfig::from_ron_str(&text)
                .with_context(|| format!("Invalid config file '{path}'"))
        }
        None => Ok(AssetDatabaseConfig::default()),
    }
}

fn write_demo_shader() -> Result<PathBuf> {
    let dir = std::env::temp_dir().join("ember-sandbox");
    std::fs::create_dir_all(&dir).context("Failed to create the sandbox asset directory")?;
    std::fs::write(
        dir.join("basic.wgsl"),
        "@vertex\nfn vs_main() {}\n@fragment\nfn fs_main() {}\n",
    )
    .context("Failed to write the demo shader")?;
    Ok(dir)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let db = AssetDatabase::create(config)?;
    let root = write_demo_shader()?;

    let catalog = Arc::new(FileCatalog::new(root));
    let shader_id = AssetId::from_name("shaders/basic.wgsl");
    catalog.insert_file(shader_id, "basic.wgsl");
    db.register_handler(Arc::new(ShaderHandler), ShaderSource::asset_type())?;
    db.register_catalog(catalog, ShaderSource::asset_type())?;

    let shader = db
        .get::<ShaderSource>(&shader_id)
        .context("The shader could not be requested")?;

    let loaded = Arc::new(AtomicBool::new(false));
    let done = loaded.clone();
    db.connect(
        &shader_id,
        Arc::new(
            AssetCallbacks::new()
                .on_ready(move |asset| {
                    log::info!("Shader {} is ready", asset.id());
                    done.store(true, Ordering::SeqCst);
                })
                .on_error(|asset| log::error!("Shader {} failed to load", asset.id())),
        ),
    );

    let deadline = Instant::now() + Duration::from_secs(5);
    while !loaded.load(Ordering::SeqCst) {
        if shader.is_error() || Instant::now() > deadline {
            db.dispatch_events();
            bail!("The shader did not load (status {:?})", shader.status());
        }
        db.dispatch_events();
        std::thread::sleep(Duration::from_millis(5));
    }

    let mut entity = Entity::new("triangle");
    entity.create_component(Renderer {
        owner: None,
        shader,
    })?;
    entity.create_component(Transform {
        position: [0.0, 0.0, -1.0],
    })?;

    entity.init()?;
    entity.activate()?;
    log::info!("Activation order: {:?}", entity.activation_order());
    entity.deactivate()?;
    entity.destroy();

    db.dispatch_events();
    log::info!("{} asset(s) still registered", db.asset_count());
    db.destroy();
    Ok(())
}

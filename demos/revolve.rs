//! Spinning geometry presets under a couple of lights.
//!
//! Shows the whole loop: setup builds a shader and three meshes from the
//! geometry presets, the update callback spins their transform nodes and
//! draws them, and an imgui slider adjusts the spin speed.
//!
//! Run with `cargo run --example revolve`. W/A/S/D moves, the mouse looks
//! around (Escape toggles), scrolling zooms.

use std::cell::RefCell;
use std::rc::Rc;

use cairn::prelude::*;

struct Scene {
    shader: ShaderProgram,
    meshes: Vec<Mesh>,
    nodes: Vec<NodeId>,
    root: NodeId,
    lights: LightSet,
}

fn main() -> anyhow::Result<()> {
    let mut app = cairn::default();

    let scene: Rc<RefCell<Option<Scene>>> = Rc::new(RefCell::new(None));
    let spin_speed = Rc::new(RefCell::new(30.0f32));

    let setup_scene = scene.clone();
    app.set_setup(move |ctx| {
        let shader = ShaderProgram::phong(&ctx.device, &ctx.queue, ctx.surface_format);

        let mut meshes = vec![
            Mesh::from_interleaved(&CUBE_VERTICES),
            Mesh::from_interleaved(&sphere_vertices(24)),
            Mesh::from_interleaved(&cone_vertices(24, 0.4)),
        ];
        for mesh in &mut meshes {
            mesh.upload(&ctx.device, &shader, &[]);
        }

        let root = ctx.transforms.spawn();
        let nodes: Vec<NodeId> = (0..meshes.len())
            .map(|i| {
                let node = ctx
                    .transforms
                    .spawn_at(Vector3::new(i as f32 * 2.0 - 2.0, 0.0, 0.0));
                ctx.transforms.set_parent(node, root);
                node
            })
            .collect();

        let mut lights = LightSet::new();
        lights.push(DirLight::new(Vector3::new(-0.3, -1.0, -0.2)));
        let mut lamp = PointLight::new(Vector3::new(0.0, 3.0, 3.0));
        lamp.linear = 0.09;
        lamp.quadratic = 0.032;
        lights.push(lamp);
        lights.push(SpotLight::new(
            Vector3::new(0.0, 4.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            12.5,
            17.5,
        ));

        *setup_scene.borrow_mut() = Some(Scene {
            shader,
            meshes,
            nodes,
            root,
            lights,
        });
    });

    let update_scene = scene.clone();
    let update_speed = spin_speed.clone();
    app.set_update(move |ctx, pass| {
        let mut scene = update_scene.borrow_mut();
        let Some(scene) = scene.as_mut() else {
            return;
        };
        let speed = *update_speed.borrow();

        // the shared root turns slowly, every shape spins on its own axis
        ctx.transforms
            .rotate(scene.root, Deg(ctx.dt * speed * 0.25), Vector3::unit_y());
        for &node in &scene.nodes {
            ctx.transforms
                .rotate(node, Deg(ctx.dt * speed), Vector3::new(1.0, 1.0, 0.0));
        }

        scene.shader.update_camera(&ctx.camera);
        scene.shader.set_uniform("material.shininess", 32.0f32);
        scene.lights.apply(&mut scene.shader);
        scene.shader.flush_uniforms();
        scene.shader.bind(pass);

        for (mesh, &node) in scene.meshes.iter().zip(&scene.nodes) {
            mesh.set_model_matrix(&ctx.queue, ctx.transforms.model_matrix(node));
            mesh.draw(&mut scene.shader, pass, &[]);
        }
    });

    let ui_speed = spin_speed.clone();
    app.set_ui(move |ui| {
        ui.window("controls")
            .size([280.0, 90.0], imgui::Condition::FirstUseEver)
            .build(|| {
                ui.slider("spin speed", 0.0, 180.0, &mut *ui_speed.borrow_mut());
            });
    });

    let teardown_scene = scene.clone();
    app.set_teardown(move |_ctx| {
        // GPU objects drop with the scene
        teardown_scene.borrow_mut().take();
    });

    app.run();
    Ok(())
}

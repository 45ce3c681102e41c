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

// Kei Sandbox
// Drives the core subsystems through a scripted session: a fake platform
// layer feeds input, a worker thread reports window resizes, and the game
// quits when Escape is pressed.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use kei_core::event::{handler, EventHandler, QueuedEvent};
use kei_core::memory::MemoryBlock;
use kei_core::{
    Button, CoreConfig, EventBus, EventCode, EventContext, InputState, Key, List, MemoryTag,
    TaggedAllocator,
};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct GameState {
    delta_time: f32,
    frame: u32,
}

/// What the platform layer reports in one frame.
#[derive(Debug, Clone, Copy)]
enum PlatformMessage {
    Key(Key, bool),
    Button(Button, bool),
    MouseMove(i16, i16),
    Wheel(i32),
}

fn scripted_frames() -> Vec<Vec<PlatformMessage>> {
    use PlatformMessage as M;
    vec![
        vec![M::MouseMove(640, 360)],
        vec![M::Key(Key::A, true), M::Button(Button::Left, true)],
        vec![M::Key(Key::A, false), M::MouseMove(700, 380), M::Wheel(120)],
        vec![M::Button(Button::Left, false), M::Key(Key::W, true)],
        vec![M::Key(Key::W, false)],
        vec![M::Key(Key::ESCAPE, true)],
        // Never reached: the escape handler stops the loop first.
        vec![M::Key(Key::SPACE, true)],
    ]
}

struct SandboxApp {
    allocator: Arc<TaggedAllocator>,
    bus: EventBus,
    input: InputState,
    running: Rc<Cell<bool>>,
    state_block: Option<MemoryBlock>,
    frame_times: List<f32>,
    on_quit: EventHandler,
    on_key: EventHandler,
    on_resize: EventHandler,
}

impl SandboxApp {
    fn new(config: CoreConfig) -> Result<Self> {
        let allocator = Arc::new(TaggedAllocator::new(config.memory));

        let bus = EventBus::new(Arc::clone(&allocator), config.events);
        bus.initialize()?;
        let input = InputState::new();

        let state_block = allocator.allocate(std::mem::size_of::<GameState>(), MemoryTag::Game)?;
        let frame_times = List::new(Arc::clone(&allocator))?;

        let running = Rc::new(Cell::new(true));
        let running_in = Rc::clone(&running);
        let on_quit = handler(move |_, _| {
            log::info!("APPLICATION_QUIT received, shutting down.");
            running_in.set(false);
            true
        });
        let on_key = handler(|bus, event| {
            let key = event.context.as_u16()[0];
            match event.code {
                EventCode::KEY_PRESSED if key == u16::from(Key::ESCAPE.0) => {
                    // Other listeners may care about the quit too.
                    if let Err(e) = bus.fire(EventCode::APPLICATION_QUIT, None, EventContext::default()) {
                        log::error!("Failed to fire quit event: {e}");
                    }
                    true
                }
                EventCode::KEY_PRESSED => {
                    log::debug!("'{}' key pressed in window.", char::from(key as u8));
                    false
                }
                _ => {
                    log::debug!("'{}' key released in window.", char::from(key as u8));
                    false
                }
            }
        });
        let on_resize = handler(|_, event| {
            let [width, height, ..] = event.context.as_u16();
            log::info!("Window resized to {width}x{height}.");
            false
        });

        bus.register(EventCode::APPLICATION_QUIT, None, &on_quit)?;
        bus.register(EventCode::KEY_PRESSED, None, &on_key)?;
        bus.register(EventCode::KEY_RELEASED, None, &on_key)?;
        bus.register(EventCode::RESIZED, None, &on_resize)?;

        Ok(Self {
            allocator,
            bus,
            input,
            running,
            state_block: Some(state_block),
            frame_times,
            on_quit,
            on_key,
            on_resize,
        })
    }

    fn run(&mut self) -> Result<()> {
        log::info!("{}", self.allocator.usage_report());

        let resizer = self.bus.sender();
        let worker = thread::spawn(move || {
            let context = EventContext::from_u16([1280, 720, 0, 0, 0, 0, 0, 0]);
            resizer.send(QueuedEvent::new(EventCode::RESIZED, context))
        });
        worker
            .join()
            .map_err(|_| anyhow::anyhow!("resize worker panicked"))?
            .map_err(|e| anyhow::anyhow!("event queue closed: {e}"))?;

        let mut game = GameState::default();
        for messages in scripted_frames() {
            if !self.running.get() {
                break;
            }
            for message in messages {
                self.process(message)?;
            }
            self.bus.pump()?;

            game.frame += 1;
            game.delta_time = 1.0 / 60.0;
            self.frame_times.push(game.delta_time)?;
            if let Some(block) = self.state_block.as_mut() {
                block.copy_from_slice(bytemuck::bytes_of(&game));
            }

            // Input is the last thing updated before the frame ends.
            self.input.update();
        }

        log::info!(
            "Ran {} frames, mouse last seen at {:?}.",
            self.frame_times.len(),
            self.input.mouse_position()
        );
        Ok(())
    }

    fn process(&mut self, message: PlatformMessage) -> Result<()> {
        match message {
            PlatformMessage::Key(key, pressed) => self.input.process_key(&self.bus, key, pressed)?,
            PlatformMessage::Button(button, pressed) => {
                self.input.process_button(&self.bus, button, pressed)?
            }
            PlatformMessage::MouseMove(x, y) => self.input.process_mouse_move(&self.bus, x, y)?,
            PlatformMessage::Wheel(delta) => self.input.process_mouse_wheel(&self.bus, delta)?,
        }
        Ok(())
    }

    fn shutdown(mut self) -> Result<()> {
        // Unregister before the event subsystem goes down.
        self.bus
            .unregister(EventCode::APPLICATION_QUIT, None, &self.on_quit)?;
        self.bus.unregister(EventCode::KEY_PRESSED, None, &self.on_key)?;
        self.bus.unregister(EventCode::KEY_RELEASED, None, &self.on_key)?;
        self.bus.unregister(EventCode::RESIZED, None, &self.on_resize)?;
        self.bus.shutdown();

        self.frame_times.destroy();
        if let Some(block) = self.state_block.take() {
            self.allocator
                .free(block, std::mem::size_of::<GameState>(), MemoryTag::Game);
        }

        log::info!("{}", self.allocator.usage_report());
        Ok(())
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => CoreConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => CoreConfig::default(),
    };
    config.validate()?;

    let mut app = SandboxApp::new(config)?;
    app.run()?;
    app.shutdown()
}
